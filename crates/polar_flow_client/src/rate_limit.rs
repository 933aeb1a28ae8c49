//! Per-host request spacing.
//!
//! Every request to a host waits until at least `throttle` has elapsed since the
//! previous request to the same host. The first request to a host never waits.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{Instant, sleep};

pub const DEFAULT_THROTTLE_SECONDS: f64 = 1.0;

#[derive(Debug)]
pub struct RateLimiter {
    throttle: Duration,
    last_request: HashMap<String, Instant>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_SECONDS)
    }
}

impl RateLimiter {
    /// Create a limiter spacing requests by `throttle_seconds`.
    ///
    /// Zero, negative or non-finite values disable throttling.
    pub fn new(throttle_seconds: f64) -> Self {
        let throttle = Duration::try_from_secs_f64(throttle_seconds).unwrap_or(Duration::ZERO);
        Self {
            throttle,
            last_request: HashMap::new(),
        }
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Wait for the host's slot, then record now as its last request time.
    pub async fn wait(&mut self, host: &str) {
        if let Some(last) = self.last_request.get(host) {
            let elapsed = last.elapsed();
            if elapsed < self.throttle {
                let delay = self.throttle - elapsed;
                tracing::trace!(host, delay_ms = delay.as_millis() as u64, "throttling request");
                sleep(delay).await;
            }
        }
        self.last_request.insert(host.to_string(), Instant::now());
    }
}
