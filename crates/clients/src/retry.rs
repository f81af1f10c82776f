//! Bounded retry with exponential backoff for transient failures.
//!
//! Both hosted services sit behind the same policy: transient classes
//! (timeouts, transport faults, 429, 5xx) are retried a bounded number of
//! times with jittered exponential delays; everything else fails on the
//! first attempt.

use std::future::Future;
use std::time::Duration;

use matric_core::{GenerationError, RetrievalError};
use tracing::warn;

/// Errors that can classify themselves as worth retrying.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for RetrievalError {
    fn is_transient(&self) -> bool {
        RetrievalError::is_transient(self)
    }
}

impl Transient for GenerationError {
    fn is_transient(&self) -> bool {
        GenerationError::is_transient(self)
    }
}

/// Retry schedule: `max_attempts` total tries, exponential delay between
/// them, capped at `max_delay` before jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &matric_config::RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Delay before attempt `attempt + 1`, with up to 25% added jitter so
    /// concurrent requests do not retry in lockstep.
    fn delay_for(&self, attempt: u32) -> Duration {
        use rand::Rng;
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        let jitter = rand::rng().random_range(0.0..=0.25);
        exp.mul_f64(1.0 + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250), Duration::from_millis(2000))
    }
}

/// Run `op` under the policy. Non-transient errors and the final attempt's
/// error return immediately.
pub async fn retry_request<T, E, F, Fut>(label: &str, policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < policy.max_attempts && err.is_transient() => {
                let delay = policy.delay_for(attempt);
                warn!(
                    call = label,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
