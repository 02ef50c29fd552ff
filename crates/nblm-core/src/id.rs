use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Step between consecutive `_reqid` values, matching the web frontend.
pub const REQUEST_ID_STEP: u64 = 100_000;

/// Per-client source of `_reqid` values.
///
/// The counter starts at a random four digit base so two processes sharing a
/// session do not collide on their first request. Values only ever grow.
#[derive(Debug)]
pub struct RequestCounter {
    next: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        let base = rand::thread_rng().gen_range(1000..10_000);
        Self::starting_at(base)
    }

    pub fn starting_at(base: u64) -> Self {
        Self {
            next: AtomicU64::new(base),
        }
    }

    /// Returns the next request id. Safe to call from concurrent tasks.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(REQUEST_ID_STEP, Ordering::Relaxed) + REQUEST_ID_STEP
    }
}

impl Default for RequestCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Fresh conversation id for a new multi-turn chat context.
pub fn conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
