//! Backoff for install attempts and keep-alive bounds for events.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::CommonError;

/// Exponential backoff schedule.
///
/// Attempt 1 runs immediately; attempt `n` waits
/// `initial_delay * multiplier^(n - 2)`, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Stretch each wait by up to a quarter, at random.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Run once, never retry.
    pub fn none() -> Self {
        Self::default().with_attempts(1)
    }

    /// Same curve, different budget. Zero is treated as one.
    pub fn with_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Wait before `attempt` (1-indexed), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let Some(exponent) = attempt.checked_sub(2) else {
            return Duration::ZERO;
        };
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent as i32);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }

    fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter && !base.is_zero() {
            base.mul_f64(1.0 + rand::thread_rng().gen_range(0.0..0.25))
        } else {
            base
        }
    }
}

/// Retry `operation` until it succeeds or the budget runs out.
pub async fn retry_with_backoff<T, E, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff_when(config, |_| true, operation).await
}

/// Like [`retry_with_backoff`], but stop early on errors `should_retry` rejects.
///
/// `operation` receives the attempt number, starting at 1.
pub async fn retry_with_backoff_when<T, E, P, F, Fut>(
    config: &RetryConfig,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    P: Fn(&E) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let budget = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let wait = config.delay(attempt);
        if !wait.is_zero() {
            debug!(attempt, ?wait, "Backing off");
            sleep(wait).await;
        }

        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let retry = attempt < budget && should_retry(&error);
        warn!(attempt, budget, retry, error = %error, "Attempt failed");
        if !retry {
            return Err(error);
        }
    }
}

/// Bound how long `operation` may run.
pub async fn with_timeout<T, F, Fut>(limit: Duration, operation: F) -> crate::Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    tokio::time::timeout(limit, operation())
        .await
        .map_err(|_| CommonError::Timeout(limit))
}
