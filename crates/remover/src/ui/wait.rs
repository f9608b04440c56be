//! Wait-for-condition primitive

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{RemovalError, Result};

/// Timeout and poll interval for a wait
#[derive(Debug, Clone, Copy)]
pub struct WaitSpec {
    pub timeout: Duration,
    pub poll: Duration,
}

impl WaitSpec {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }
}

/// Poll `probe` until it yields a value or the timeout expires
///
/// The probe runs at least once. Errors from the probe end the wait
/// immediately.
pub async fn wait_for<T, F, Fut>(what: &str, spec: WaitSpec, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + spec.timeout;
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(RemovalError::Timeout {
                what: what.to_string(),
                timeout: spec.timeout,
            });
        }
        tokio::time::sleep(spec.poll.min(deadline - now)).await;
    }
}
