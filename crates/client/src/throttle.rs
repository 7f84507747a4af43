//! Minimum-interval rate limiting for outbound calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Rate limiter to enforce request intervals.
///
/// Callers queue on the internal lock, so concurrent `acquire` calls are
/// released one at a time, each at least `min_interval` after the previous.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self { last_request: Mutex::new(None), min_interval }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Acquire permission to make a request, waiting if necessary.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
