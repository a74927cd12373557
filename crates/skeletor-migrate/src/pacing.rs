//! Unconditional pause before GitHub writes.
//!
//! GitHub's secondary rate limits punish bursts of content-creating
//! requests. The pause is a `tokio` timer, so other in-flight migrations
//! keep running while one of them waits.

use std::time::Duration;
use tracing::trace;

/// Fixed delay applied before every create/patch call.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// A pacer that never waits.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the configured delay.
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        trace!(delay_ms = self.delay.as_millis() as u64, "Pacing write");
        tokio::time::sleep(self.delay).await;
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
