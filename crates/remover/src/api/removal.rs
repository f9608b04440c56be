//! Removal through the official playlist API

use async_trait::async_trait;
use tracing::{info, warn};

use wl_core::task::{ContentId, Outcome};

use super::scanner::PlaylistScanner;
use crate::error::{RemovalError, Result};
use crate::strategy::RemovalStrategy;

/// Scan the playlist for the content id, then delete the matching entry
pub struct ApiRemoval {
    scanner: PlaylistScanner,
    playlist_id: String,
}

impl ApiRemoval {
    pub fn new(scanner: PlaylistScanner, playlist_id: impl Into<String>) -> Self {
        Self {
            scanner,
            playlist_id: playlist_id.into(),
        }
    }
}

#[async_trait]
impl RemovalStrategy for ApiRemoval {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn open(&self) -> Result<()> {
        self.scanner.api().authorize().await?;
        info!("Playlist API credentials accepted");
        Ok(())
    }

    async fn remove(&self, content_id: &ContentId) -> Outcome {
        let entry = match self
            .scanner
            .find_entry(&self.playlist_id, content_id.as_str())
            .await
        {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                info!("{} is not in playlist {}", content_id, self.playlist_id);
                return Outcome::AlreadyAbsent;
            }
            Err(e) => {
                warn!("Playlist scan for {} failed: {}", content_id, e);
                return Outcome::failed(e.into_failure("scan"));
            }
        };

        match self.scanner.api().delete(&entry.entry_id).await {
            Ok(()) => {
                info!(
                    "Removed {} (entry {}) from playlist {}",
                    content_id, entry.entry_id, self.playlist_id
                );
                Outcome::Removed
            }
            // The entry went away between the scan and the delete
            Err(RemovalError::Api {
                status: Some(404), ..
            }) => {
                info!("Entry {} for {} already gone", entry.entry_id, content_id);
                Outcome::AlreadyAbsent
            }
            Err(e) => {
                warn!("Deleting entry {} for {} failed: {}", entry.entry_id, content_id, e);
                Outcome::failed(e.into_failure("delete"))
            }
        }
    }
}
