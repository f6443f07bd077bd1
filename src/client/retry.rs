//! Retry with exponential backoff
//!
//! Only network-level failures are retried. HTTP error statuses, decode
//! failures and validation errors are returned on the first occurrence.
//!
//! There is no overall deadline: a call can take up to
//! `timeout * max_attempts` plus the sum of all backoff delays.

use super::error::{ClientError, ClientResult};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Default number of attempts, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Retry configuration for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failure; doubles for each further failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Single attempt, never retry
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Whether an error is worth another attempt
    pub fn is_retryable(error: &ClientError) -> bool {
        matches!(error, ClientError::Transport(_))
    }

    /// Delay before the attempt following failed attempt `attempt` (0-based),
    /// without jitter: `base * 2^attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Backoff plus uniform jitter in `[0, base_delay)`.
    ///
    /// The jitter never exceeds the base delay, so successive delays are
    /// non-decreasing.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base_nanos = self.base_delay.as_nanos() as u64;
        let jitter = if base_nanos == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..base_nanos)
        };
        self.backoff(attempt)
            .saturating_add(Duration::from_nanos(jitter))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    ///
    /// When every attempt fails at the network layer, the last transport
    /// error is returned as [`ClientError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> ClientResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(ClientError::Transport(source)) if attempt + 1 >= max_attempts => {
                    tracing::warn!(
                        attempts = max_attempts,
                        error = %source,
                        "Giving up after transport failures"
                    );
                    return Err(ClientError::RetriesExhausted {
                        attempts: max_attempts,
                        source,
                    });
                }
                Err(e) if Self::is_retryable(&e) => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
