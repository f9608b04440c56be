//! Playlist API removal strategy

mod client;
mod oauth;
mod removal;
mod scanner;

pub use client::{PlaylistApi, PlaylistEntry, PlaylistPage, YouTubeClient};
pub use oauth::{AuthorizedUser, Credentials, WRITE_SCOPES};
pub use removal::ApiRemoval;
pub use scanner::PlaylistScanner;
