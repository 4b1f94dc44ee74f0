//! Fixed-window counter storage, backing the durable rate limiter.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use vouch_types::Timestamp;

/// Outcome of consuming one unit from a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDecision {
    pub allowed: bool,
    pub remaining: u32,
}

/// Trait for windowed counters.
pub trait CounterStore {
    /// Atomically consume one unit from the window for `key`.
    ///
    /// A window that does not exist or whose reset time has passed is
    /// restarted at `now` with a reset of `now + window_secs`. A rejected
    /// consume leaves the count unchanged.
    fn consume_window(
        &self,
        key: &str,
        max: u32,
        window_secs: u64,
        now: Timestamp,
    ) -> Result<WindowDecision, StoreError>;

    /// Delete windows whose reset time is at or before `now`. Returns how many.
    fn purge_expired_windows(&self, now: Timestamp) -> Result<usize, StoreError>;
}
