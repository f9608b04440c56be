//! Reconciliation run report

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::task::{ContentId, Outcome};

/// Whether a task's outcome reached the task source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteBack {
    Committed,
    /// The write failed; the record keeps its previous flags
    Rejected { message: String },
}

/// Outcome of a single task within a run
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub content_id: ContentId,
    pub title: String,
    pub outcome: Outcome,
    pub attempts: u32,
    pub write_back: WriteBack,
}

impl TaskOutcome {
    /// Succeeded only when the removal reached the end state and was recorded
    pub fn is_success(&self) -> bool {
        self.outcome.is_success() && self.write_back == WriteBack::Committed
    }
}

/// Summary of one reconciliation run
///
/// Built through [`ReportBuilder`]; read-only once finished.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    total_tasks: usize,
    succeeded: usize,
    failed: usize,
    outcomes: Vec<TaskOutcome>,
}

impl ReconciliationReport {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn total_tasks(&self) -> usize {
        self.total_tasks
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    /// Tasks that still need attention
    pub fn unresolved(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = self.finished_at - self.started_at;
        writeln!(
            f,
            "Run {}: {} of {} tasks reconciled, {} failed ({} ms)",
            self.run_id,
            self.succeeded,
            self.total_tasks,
            self.failed,
            elapsed.num_milliseconds()
        )?;
        for item in &self.outcomes {
            let mark = if item.is_success() { "ok" } else { "!!" };
            write!(
                f,
                "  [{}] {} ({}): {}",
                mark, item.title, item.content_id, item.outcome
            )?;
            if let WriteBack::Rejected { message } = &item.write_back {
                write!(f, " [write-back failed: {}]", message)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Incremental builder for [`ReconciliationReport`]
#[derive(Debug)]
pub struct ReportBuilder {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    outcomes: Vec<TaskOutcome>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn record(&mut self, outcome: TaskOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(self) -> ReconciliationReport {
        let succeeded = self.outcomes.iter().filter(|o| o.is_success()).count();
        let total_tasks = self.outcomes.len();
        ReconciliationReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            total_tasks,
            succeeded,
            failed: total_tasks - succeeded,
            outcomes: self.outcomes,
        }
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::FailureReason;

    fn outcome(id: &str, outcome: Outcome, write_back: WriteBack) -> TaskOutcome {
        TaskOutcome {
            task_id: format!("page-{}", id),
            content_id: ContentId::new(id).unwrap(),
            title: format!("Video {}", id),
            outcome,
            attempts: 1,
            write_back,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = ReportBuilder::new().finish();
        assert_eq!(report.total_tasks(), 0);
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 0);
        assert!(report.finished_at() >= report.started_at());
    }

    #[test]
    fn test_counts_add_up() {
        let mut builder = ReportBuilder::new();
        builder.record(outcome("a1", Outcome::Removed, WriteBack::Committed));
        builder.record(outcome("a2", Outcome::AlreadyAbsent, WriteBack::Committed));
        builder.record(outcome("a3", Outcome::NotFound, WriteBack::Committed));
        builder.record(outcome(
            "a4",
            Outcome::failed(FailureReason::Driver {
                message: "crashed".into(),
            }),
            WriteBack::Committed,
        ));
        builder.record(outcome(
            "a5",
            Outcome::Removed,
            WriteBack::Rejected {
                message: "conflict".into(),
            },
        ));
        let report = builder.finish();

        assert_eq!(report.total_tasks(), 5);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 3);
        assert_eq!(report.succeeded() + report.failed(), report.total_tasks());
        assert_eq!(report.unresolved().count(), 3);
    }

    #[test]
    fn test_display_lists_every_task() {
        let mut builder = ReportBuilder::new();
        builder.record(outcome("a1", Outcome::Removed, WriteBack::Committed));
        builder.record(outcome("a2", Outcome::NotFound, WriteBack::Committed));
        let text = builder.finish().to_string();

        assert!(text.contains("1 of 2 tasks reconciled, 1 failed"));
        assert!(text.contains("[ok] Video a1 (a1): removed"));
        assert!(text.contains("[!!] Video a2 (a2): not found"));
    }
}
