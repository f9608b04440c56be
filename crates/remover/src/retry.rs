//! Bounded retry around a removal attempt

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use wl_core::config::RetryConfig;
use wl_core::task::Outcome;

/// Attempt limit and backoff schedule
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before the given retry (1-based), doubling up to the cap, with up to 25% jitter
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        let base = self
            .initial_backoff
            .saturating_mul(1u32 << exp)
            .min(self.max_backoff);
        let jitter_cap = base.as_millis() as u64 / 4;
        let jitter = if jitter_cap > 0 {
            rand::thread_rng().gen_range(0..=jitter_cap)
        } else {
            0
        };
        base + Duration::from_millis(jitter)
    }

    /// Run `attempt` until it returns a non-retryable outcome or attempts run out
    ///
    /// Returns the final outcome and the number of attempts made.
    pub async fn run<F, Fut>(&self, label: &str, mut attempt: F) -> (Outcome, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let outcome = attempt().await;
            if !outcome.is_retryable() || attempts >= self.max_attempts {
                return (outcome, attempts);
            }
            let delay = self.backoff(attempts);
            warn!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempts, self.max_attempts, label, outcome, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}
