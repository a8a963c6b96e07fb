//! Retry bounds and deadline racing for backend initialization.
//!
//! Initialization uses a fixed delay between attempts: the backend either
//! links and starts within a few seconds or it is not going to, so there is
//! nothing to gain from growing the delay.

use std::future::Future;
use std::time::Duration;

use crate::core::config::{DEFAULT_INIT_TIMEOUT, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::error::{BridgeError, Result};

/// Bounds of the initialization state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Default: 1 (two attempts in total)
    pub max_retries: u32,

    /// Pause between a failed attempt and the next one. Default: 2000 ms
    pub retry_delay: Duration,

    /// Deadline for a single `initialize` call. Default: 15000 ms
    pub init_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            init_timeout: DEFAULT_INIT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether another attempt follows the attempt with index `attempt`
    /// (zero-based).
    pub fn has_attempts_remaining(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Worst-case time before the state machine settles when every attempt
    /// runs into its deadline.
    pub fn max_wall_time(&self) -> Duration {
        let attempts = self.total_attempts();
        self.init_timeout.saturating_mul(attempts)
            + self.retry_delay.saturating_mul(self.max_retries)
    }
}

/// Races `operation` against `deadline`.
///
/// The operation future is dropped when the deadline fires first, so a late
/// completion is never observed.
pub async fn race_deadline<T, Fut>(operation: Fut, deadline: Duration) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(BridgeError::init_timeout(deadline)),
    }
}
