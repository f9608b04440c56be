//! Reconciliation engine - drives pending tasks through a removal strategy

use std::sync::Arc;

use tracing::{error, info, warn};

use wl_core::report::{ReconciliationReport, ReportBuilder, TaskOutcome, WriteBack};
use wl_core::task::{Task, TaskSource};

use crate::error::{RemovalError, Result};
use crate::retry::RetryPolicy;
use crate::strategy::RemovalStrategy;

/// Runs one reconciliation pass over the task source
pub struct ReconciliationEngine {
    source: Arc<dyn TaskSource>,
    retry: RetryPolicy,
}

impl ReconciliationEngine {
    pub fn new(source: Arc<dyn TaskSource>, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Process every pending task in source order
    ///
    /// A failed query, a failed `open` or a fatal per-task failure (rejected
    /// credentials) ends the run early; the task that hit a fatal failure is
    /// left untouched in the source. Other per-task failures are recorded in
    /// the report and the loop moves on.
    pub async fn run(&self, strategy: &dyn RemovalStrategy) -> Result<ReconciliationReport> {
        let mut report = ReportBuilder::new();
        let run_id = report.run_id();

        let tasks = self.source.query_pending().await.map_err(|e| {
            error!("Failed to query pending tasks: {}", e);
            e
        })?;
        info!(
            "Run {}: {} pending task(s), strategy {}",
            run_id,
            tasks.len(),
            strategy.name()
        );
        if tasks.is_empty() {
            return Ok(report.finish());
        }

        if let Err(e) = strategy.open().await {
            error!("Failed to open {} strategy: {}", strategy.name(), e);
            strategy.close().await;
            return Err(e);
        }

        for (index, task) in tasks.iter().enumerate() {
            info!(
                "[{}/{}] {} ({})",
                index + 1,
                tasks.len(),
                task.title,
                task.content_id
            );
            match self.process(strategy, task).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!("Stopping run {} at task {}: {}", run_id, task.task_id, e);
                    strategy.close().await;
                    return Err(e);
                }
            }
        }

        strategy.close().await;

        let report = report.finish();
        info!(
            "Run {} finished: {} succeeded, {} failed",
            run_id,
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    async fn process(&self, strategy: &dyn RemovalStrategy, task: &Task) -> Result<TaskOutcome> {
        let label = task.content_id.to_string();
        let content_id = &task.content_id;
        let (outcome, attempts) = self
            .retry
            .run(&label, move || strategy.remove(content_id))
            .await;

        if let Some(reason) = outcome.fatal_reason() {
            return Err(RemovalError::auth(reason.to_string()));
        }

        if outcome.is_success() {
            info!("{}: {}", task.content_id, outcome);
        } else {
            warn!("{}: {} after {} attempt(s)", task.content_id, outcome, attempts);
        }

        let write_back = match self.source.mark_outcome(task, &outcome).await {
            Ok(()) => WriteBack::Committed,
            Err(e) => {
                error!("Failed to record outcome for task {}: {}", task.task_id, e);
                WriteBack::Rejected {
                    message: e.to_string(),
                }
            }
        };

        Ok(TaskOutcome {
            task_id: task.task_id.clone(),
            content_id: task.content_id.clone(),
            title: task.title.clone(),
            outcome,
            attempts,
            write_back,
        })
    }
}
