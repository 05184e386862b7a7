//! Injectable delay strategy for the simulated worker-location search.
//!
//! Production uses a randomized wait inside a configured window to model
//! external search latency; tests inject `NoDelay` to force immediate
//! resolution.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

/// Strategy for the pause between entering `Searching` and the worker
/// options becoming available.
#[async_trait]
pub trait SearchDelay: Send + Sync {
    async fn wait(&self);
}

/// Randomized delay bounded within a min/max window.
pub struct RandomizedDelay {
    min: Duration,
    max: Duration,
}

impl RandomizedDelay {
    /// Build a delay strategy. `min` must not exceed `max` — config
    /// validation enforces this before we get here.
    pub fn new(min: Duration, max: Duration) -> Self {
        debug_assert!(min <= max);
        Self { min, max }
    }
}

#[async_trait]
impl SearchDelay for RandomizedDelay {
    async fn wait(&self) {
        // Sample before awaiting: thread_rng is not Send across await points
        let millis = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.min.as_millis()..=self.max.as_millis()) as u64
        };
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// Zero-wait strategy for tests.
pub struct NoDelay;

#[async_trait]
impl SearchDelay for NoDelay {
    async fn wait(&self) {}
}
