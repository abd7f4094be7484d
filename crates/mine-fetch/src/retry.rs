//! Timeout and exponential backoff around a single transport

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::{FetchError, Fetcher};

/// How hard to try before giving up on one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    /// Budget for each individual attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(500),
            multiplier: 2.0,
            max_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_multiplier(self.multiplier)
            .with_max_interval(self.max_interval)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Fetch `locator`, retrying transient failures per `policy`.
///
/// Every attempt gets its own timeout. `NotFound` and `Rejected` are
/// returned immediately.
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    locator: &str,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, FetchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut schedule = policy.schedule();
    let mut attempt = 1;

    loop {
        let result = match tokio::time::timeout(policy.timeout, fetcher.fetch(locator)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        };

        match result {
            Ok(bytes) => return Ok(bytes),
            Err(error) if error.is_transient() && attempt < max_attempts => {
                let delay = schedule.next_backoff().unwrap_or(policy.max_interval);
                tracing::debug!(locator, attempt, ?delay, %error, "Retrying fetch");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                tracing::debug!(locator, attempt, %error, "Fetch failed");
                return Err(error);
            }
        }
    }
}
