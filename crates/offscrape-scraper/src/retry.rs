//! Bounded exponential backoff for page fetches.
//!
//! Only transport failures ([`ScraperError::is_transport`]) are retried.
//! A non-HTML response or any other error is returned immediately since a
//! second request would get the same answer.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// How many times to try a request and how long to wait in between.
///
/// The wait before retry `n` (1-based) is
/// `min(base_delay * multiplier^(n-1), max_delay)`.
///
/// | Retry | Wait with the default policy |
/// |-------|------------------------------|
/// | 1     | 1 s                          |
/// | 2     | 2 s                          |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first try included. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// No sleeping between attempts; used by tests against mock servers.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait before the given retry (1-based).
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(scaled.max(0.0))
    }
}

/// Runs `operation` until it succeeds, fails with a non-transport error, or
/// the attempt budget is spent. The last error is returned.
///
/// `operation` receives the 1-based attempt number.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transport() || attempt >= max_attempts {
                    if attempt > 1 {
                        tracing::warn!(url, attempt, max_attempts, error = %err, "giving up on fetch");
                    }
                    return Err(err);
                }
                let delay = policy.delay_for_retry(attempt);
                tracing::warn!(
                    url,
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient fetch error, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
