//! Request pacing for NCBI API compliance
//!
//! NCBI E-utilities allow 3 requests per second without an API key and
//! 10 with one. Every outgoing request, retries included, is preceded by a
//! fixed sleep so that sequential traffic stays under that ceiling.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, instrument};

/// Delay used without an API key (stays under 3 requests/second)
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Delay used with an API key
pub const API_KEY_REQUEST_DELAY: Duration = Duration::from_millis(340);

/// Fixed-delay rate limiter shared by every request of a session
#[derive(Clone, Debug)]
pub struct RateLimiter {
    delay: Duration,
    issued: Arc<AtomicU64>,
}

impl RateLimiter {
    /// Create a rate limiter that sleeps `delay` before each request
    ///
    /// # Example
    ///
    /// ```
    /// use pmc_crawler::rate_limit::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let limiter = RateLimiter::new(Duration::from_millis(500));
    /// assert_eq!(limiter.delay(), Duration::from_millis(500));
    /// ```
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Rate limiter for NCBI API without API key
    pub fn ncbi_default() -> Self {
        Self::new(DEFAULT_REQUEST_DELAY)
    }

    /// Rate limiter for NCBI API with API key
    pub fn ncbi_with_key() -> Self {
        Self::new(API_KEY_REQUEST_DELAY)
    }

    /// Wait for the configured delay before issuing a request
    #[instrument(skip(self))]
    pub async fn acquire(&self) {
        if !self.delay.is_zero() {
            debug!(delay_ms = self.delay.as_millis() as u64, "Pacing request");
            sleep(self.delay).await;
        }
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Configured delay before each request
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of requests that passed through this limiter (shared across clones)
    pub fn requests_issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}
