//! Task module
//!
//! This module contains task-related types and logic.

mod content_id;
mod model;
mod outcome;
mod source;

pub use content_id::{parse_content_id, ContentId};
pub use model::Task;
pub use outcome::{FailureReason, Outcome};
pub use source::{FlagUpdate, TaskSource};
