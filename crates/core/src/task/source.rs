//! Task source trait
//!
//! Defines the interface to the document database holding the removal list.

use async_trait::async_trait;

use super::model::Task;
use super::outcome::Outcome;
use crate::Result;

/// Flag values written back for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagUpdate {
    /// Value of the "pending delete" flag
    pub pending: bool,
    /// Value of the "deleted" flag
    pub deleted: bool,
}

impl FlagUpdate {
    /// Flags to persist for an outcome
    ///
    /// Failures keep the task pending so the next run picks it up again.
    pub fn for_outcome(outcome: &Outcome) -> Self {
        if outcome.is_success() {
            Self {
                pending: false,
                deleted: true,
            }
        } else {
            Self {
                pending: true,
                deleted: false,
            }
        }
    }
}

/// Source of pending removal tasks
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetch every task currently flagged for removal
    ///
    /// Records whose link cannot be parsed are skipped with a warning.
    async fn query_pending(&self) -> Result<Vec<Task>>;

    /// Persist the outcome of a removal attempt
    ///
    /// Writes absolute flag values, so repeating a call is a no-op remotely.
    async fn mark_outcome(&self, task: &Task, outcome: &Outcome) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::FailureReason;

    #[test]
    fn test_flags_for_success() {
        for outcome in [Outcome::Removed, Outcome::AlreadyAbsent] {
            let flags = FlagUpdate::for_outcome(&outcome);
            assert!(!flags.pending);
            assert!(flags.deleted);
        }
    }

    #[test]
    fn test_flags_for_failure_keep_task_visible() {
        let failures = [
            Outcome::NotFound,
            Outcome::failed(FailureReason::TimeoutOrElementMissing {
                step: "metadata".into(),
                detail: "missing".into(),
            }),
        ];
        for outcome in failures {
            let flags = FlagUpdate::for_outcome(&outcome);
            assert!(flags.pending);
            assert!(!flags.deleted);
        }
    }
}
