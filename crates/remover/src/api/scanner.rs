//! Playlist scan for a single content id
//!
//! The playlist API has no lookup by video id, so finding an entry means
//! walking the pages until the id shows up or the pages run out.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::client::{PlaylistApi, PlaylistEntry};
use crate::error::Result;

/// Locates playlist entries by content id
pub struct PlaylistScanner {
    api: Arc<dyn PlaylistApi>,
}

impl PlaylistScanner {
    pub fn new(api: Arc<dyn PlaylistApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<dyn PlaylistApi> {
        &self.api
    }

    /// Find the entry holding `content_id`, stopping at the first match
    pub async fn find_entry(
        &self,
        playlist_id: &str,
        content_id: &str,
    ) -> Result<Option<PlaylistEntry>> {
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0u32;

        loop {
            let page = self.api.list(playlist_id, page_token.as_deref()).await?;
            pages += 1;

            if let Some(entry) = page.items.into_iter().find(|e| e.content_id == content_id) {
                debug!(
                    "Found {} as entry {} after {} page(s)",
                    content_id, entry.entry_id, pages
                );
                return Ok(Some(entry));
            }

            match page.next_page_token {
                Some(next) if seen_tokens.insert(next.clone()) => page_token = Some(next),
                _ => {
                    debug!("{} not in {} ({} page(s) scanned)", content_id, playlist_id, pages);
                    return Ok(None);
                }
            }
        }
    }
}
