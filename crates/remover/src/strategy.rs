//! Removal strategy abstraction

use async_trait::async_trait;

use wl_core::task::{ContentId, Outcome};

use crate::error::Result;

/// A way of taking one video out of the Watch Later playlist
///
/// `remove` never returns an error: every per-task problem is folded into
/// [`Outcome::Failed`]. Only `open` can fail the run, and `close` must be
/// safe to call more than once.
#[async_trait]
pub trait RemovalStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Acquire run-scoped resources before the first task
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    /// Remove one content id from the playlist
    async fn remove(&self, content_id: &ContentId) -> Outcome;

    /// Release run-scoped resources
    async fn close(&self) {}
}
