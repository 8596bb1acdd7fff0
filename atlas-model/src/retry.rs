//! Bounded retry with exponential backoff for rate-limited calls.

use std::future::Future;
use std::time::Duration;

use atlas_core::LlmConfig;
use tracing::{info, warn};

use crate::error::LlmError;

/// Upper bound on the computed backoff. A server `Retry-After` hint may exceed it.
pub const MAX_BACKOFF: Duration = Duration::from_secs(32);

/// How often and how patiently to retry a rate-limited call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
    /// Cap on the doubled delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.retry_backoff_ms),
            max_delay: MAX_BACKOFF,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Delay after the zero-based `attempt` failed, honouring a longer server hint.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let factor = 1u32 << attempt.min(16);
        let backoff = self.base_delay.saturating_mul(factor).min(self.max_delay);
        match retry_after {
            Some(hint) => backoff.max(hint),
            None => backoff,
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or attempts run out.
///
/// # Errors
///
/// Non-retryable errors are returned as-is from the attempt that produced them. When every
/// attempt is rate limited the result is [`LlmError::RetriesExhausted`].
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, model: &str, mut op: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => {
                if attempt + 1 >= max_attempts {
                    warn!(model, attempts = max_attempts, error = %e, "retries exhausted");
                    return Err(LlmError::RetriesExhausted {
                        attempts: max_attempts,
                        last: Box::new(e),
                    });
                }
                let retry_after = match &e {
                    LlmError::RateLimited { retry_after } => *retry_after,
                    _ => None,
                };
                let wait = policy.delay_for(attempt, retry_after);
                info!(
                    model,
                    attempt = attempt + 1,
                    max_attempts,
                    backoff_ms = wait.as_millis() as u64,
                    "rate limited, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
