//! Retry with exponential backoff for transient NCBI failures
//!
//! Every request is retried on transient errors (timeouts, connection
//! failures, 5xx and 429 responses) with a delay that doubles after each
//! attempt: 1s, 2s, 4s, ... up to the configured budget.

use std::fmt::Display;
use std::future::Future;
use std::iter;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio_retry::RetryIf;
use tracing::{debug, warn};

/// Classifies errors into transient and permanent failures
pub trait RetryableError {
    /// Whether the failed operation may succeed if attempted again
    fn is_retryable(&self) -> bool;

    /// Short human-readable classification used in log output
    fn retry_reason(&self) -> &str;
}

/// Backoff policy for retried requests
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each following retry
    pub base_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Disable retries entirely
    pub fn disabled() -> Self {
        Self::default().with_max_retries(0)
    }

    /// The sequence of sleeps between attempts (`max_retries` items)
    ///
    /// # Example
    ///
    /// ```
    /// use pmc_crawler::retry::RetryConfig;
    /// use std::time::Duration;
    ///
    /// let delays: Vec<Duration> = RetryConfig::default().delays().collect();
    /// assert_eq!(
    ///     delays,
    ///     vec![
    ///         Duration::from_secs(1),
    ///         Duration::from_secs(2),
    ///         Duration::from_secs(4),
    ///     ]
    /// );
    /// ```
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let max_delay = self.max_delay;
        iter::successors(Some(self.base_delay.min(max_delay)), move |delay| {
            Some(delay.saturating_mul(2).min(max_delay))
        })
        .take(self.max_retries as usize)
    }

    /// Delay applied after the given 1-based failed attempt
    fn delay_after(&self, attempt: u32) -> Duration {
        self.delays()
            .nth(attempt.saturating_sub(1) as usize)
            .unwrap_or(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the retry budget is spent
///
/// `context` names the operation in log output.
pub async fn with_retry<F, Fut, T, E>(
    mut operation: F,
    config: &RetryConfig,
    context: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + Display,
{
    let attempts = AtomicU32::new(0);

    let action = || {
        attempts.fetch_add(1, Ordering::Relaxed);
        operation()
    };

    let condition = |err: &E| {
        let attempt = attempts.load(Ordering::Relaxed);
        if !err.is_retryable() {
            debug!(
                context,
                error = %err,
                reason = err.retry_reason(),
                "Permanent failure, not retrying"
            );
            return false;
        }
        if attempt > config.max_retries {
            warn!(
                context,
                error = %err,
                attempts = attempt,
                "Retry budget exhausted"
            );
            return false;
        }
        warn!(
            context,
            error = %err,
            reason = err.retry_reason(),
            attempt,
            max_attempts = config.max_retries + 1,
            delay_ms = config.delay_after(attempt).as_millis() as u64,
            "Request failed, retrying"
        );
        true
    };

    let result = RetryIf::spawn(config.delays(), action, condition).await;

    let attempt = attempts.load(Ordering::Relaxed);
    if result.is_ok() && attempt > 1 {
        debug!(context, attempts = attempt, "Succeeded after retry");
    }
    result
}
