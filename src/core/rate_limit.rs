//! Request rate limiting for remote services
//!
//! Token bucket refilled once per window. Shared by the embedding and
//! generation clients so a deployment can stay under provider quotas.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use parking_lot::Mutex;

/// Returned when the bucket is empty
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("rate limit exceeded, retry after {retry_after_secs} seconds")]
pub struct RateLimitExceeded {
    pub retry_after_secs: u64,
}

/// Rate limiter using token bucket algorithm
pub struct RateLimiter {
    /// Tokens available
    tokens: AtomicU64,

    /// Maximum tokens per window
    max_tokens: u64,

    /// Last refill time
    last_refill: Mutex<Instant>,

    /// Refill interval
    refill_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_minute` calls per minute
    pub fn new(requests_per_minute: u32) -> Self {
        Self::with_window(requests_per_minute, Duration::from_secs(60))
    }

    /// Create a limiter with a custom refill window
    pub fn with_window(max_requests: u32, window: Duration) -> Self {
        Self {
            tokens: AtomicU64::new(max_requests as u64),
            max_tokens: max_requests as u64,
            last_refill: Mutex::new(Instant::now()),
            refill_interval: window,
        }
    }

    /// Try to acquire a token
    pub async fn acquire(&self) -> Result<(), RateLimitExceeded> {
        let last_refill = self.refill();

        let acquired = self
            .tokens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| current.checked_sub(1))
            .is_ok();

        if acquired {
            Ok(())
        } else {
            let remaining = self.refill_interval.saturating_sub(last_refill.elapsed());
            Err(RateLimitExceeded {
                retry_after_secs: remaining.as_secs().max(1),
            })
        }
    }

    /// Refill tokens if the window has elapsed; returns the current window start
    fn refill(&self) -> Instant {
        let mut last_refill = self.last_refill.lock();

        if last_refill.elapsed() >= self.refill_interval {
            self.tokens.store(self.max_tokens, Ordering::SeqCst);
            *last_refill = Instant::now();
        }

        *last_refill
    }

    /// Get current available tokens
    pub fn available_tokens(&self) -> u64 {
        self.tokens.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(60);
        assert_eq!(limiter.available_tokens(), 60);
    }

    #[tokio::test]
    async fn test_rate_limiter_exhausts() {
        let limiter = RateLimiter::new(2);

        assert!(limiter.acquire().await.is_ok());
        assert!(limiter.acquire().await.is_ok());

        let err = limiter.acquire().await.unwrap_err();
        assert!(err.retry_after_secs >= 1 && err.retry_after_secs <= 60);
        assert_eq!(limiter.available_tokens(), 0);
    }

    #[tokio::test]
    async fn test_rate_limiter_refills_after_window() {
        let limiter = RateLimiter::with_window(1, Duration::from_millis(20));

        assert!(limiter.acquire().await.is_ok());
        assert!(limiter.acquire().await.is_err());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.acquire().await.is_ok());
    }
}
