//! Process-wide request throttle.
//!
//! The scraping proxy enforces per-account rate limits, so every outbound
//! fetch (search pages and job detail pages alike) serializes through one
//! shared throttle. The lock is held across the sleep: a second caller
//! arriving mid-delay waits for the full gap, not just the remainder.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

pub struct Throttle {
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until at least `min_delay` has passed since the previous
    /// caller was released.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_delay {
                let remaining = self.min_delay - elapsed;
                log::trace!("[THROTTLE] Waiting {:?} before next request", remaining);
                sleep(remaining).await;
            }
        }
        *last = Some(Instant::now());
    }
}
