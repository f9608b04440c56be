//! Task model definitions

use serde::{Deserialize, Serialize};

use super::content_id::{parse_content_id, ContentId};

/// A pending removal read from the task source
///
/// Tasks are rebuilt from the source on every run; `task_id` is the source
/// record's own id and the only identity that survives across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub content_id: ContentId,
    pub title: String,
    pub source_url: String,
}

impl Task {
    /// Build a task from a stored link, `None` when the link has no content id
    pub fn from_link(
        task_id: impl Into<String>,
        title: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Option<Self> {
        let source_url = source_url.into();
        let content_id = parse_content_id(&source_url)?;
        Some(Self {
            task_id: task_id.into(),
            content_id,
            title: title.into(),
            source_url,
        })
    }
}
