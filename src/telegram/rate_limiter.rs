//! Rate limiter for Telegram API calls.
//!
//! Spaces out group resolutions in batch mode and provides the fixed
//! cool-down that follows every delivered message.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Rate limiter that enforces minimum intervals between operations.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum duration between allowed operations.
    min_interval: Duration,

    /// Last time an operation was performed.
    last_operation: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_operation: Mutex::new(None),
        }
    }

    /// The configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until an operation is allowed, then marks the operation as performed.
    ///
    /// Returns the duration waited (0 if no wait was needed).
    pub async fn wait_and_acquire(&self) -> Duration {
        let mut last = self.last_operation.lock().await;

        let wait_duration = match *last {
            Some(last_time) => self.min_interval.saturating_sub(last_time.elapsed()),
            None => Duration::ZERO,
        };

        if !wait_duration.is_zero() {
            debug!(
                "Rate limiter: waiting {:?} before next operation",
                wait_duration
            );
            tokio::time::sleep(wait_duration).await;
        }

        *last = Some(Instant::now());
        wait_duration
    }

    /// Sleeps for the full interval unconditionally.
    pub async fn cool_down(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        tokio::time::sleep(self.min_interval).await;
        *self.last_operation.lock().await = Some(Instant::now());
    }
}
