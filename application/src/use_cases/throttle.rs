//! Turn Throttle
//!
//! A fixed pause between turns (and optionally between the calls of one
//! turn) to stay under an external rate limit. Not adaptive: it neither
//! watches for 429s nor refills tokens.

use super::guard::millis;
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct TurnThrottle {
    delay: Duration,
}

impl TurnThrottle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    /// Sleep for the configured delay. Returns immediately when disabled.
    pub async fn wait(&self) {
        if self.is_enabled() {
            trace!(delay_ms = millis(self.delay), "Throttling");
            tokio::time::sleep(self.delay).await;
        }
    }
}
