//! Notion document database integration

mod client;
mod property;

pub use client::{DatabaseInfo, NotionTaskSource};
pub use property::{decode_page, PropertyValue, RichText, SkipReason};
