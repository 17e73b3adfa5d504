//! Exponential backoff retry helper shared by the provider port and tool
//! retry policies (§7).

use std::time::Duration;

/// Configuration for a capped exponential backoff sequence.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Multiplicative factor applied after each attempt.
    pub backoff_factor: f64,
    /// Upper bound on any single backoff delay.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            backoff_factor: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// The delay to wait before attempt number `attempt` (0-indexed, so
    /// `attempt == 0` is the delay before the first retry).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_factor.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
        let millis = (self.initial_backoff.as_millis() as f64 * multiplier).min(u64::MAX as f64);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let capped = Duration::from_millis(millis as u64).min(self.max_backoff);
        capped
    }
}

/// Outcome of a retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The operation succeeded.
    Succeeded,
    /// Every attempt failed and retries were exhausted.
    Exhausted,
}

/// Retry an async operation up to `config.max_attempts` times, sleeping with
/// capped exponential backoff between attempts. `is_retryable` decides
/// whether a given error should trigger another attempt.
pub async fn retry<T, E, F, Fut, R>(config: RetryConfig, is_retryable: R, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= config.max_attempts || !is_retryable(&err) {
                    return Err(err);
                }
                tokio::time::sleep(config.backoff_for(attempt - 1)).await;
            }
        }
    }
}
