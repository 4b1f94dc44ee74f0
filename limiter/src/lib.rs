//! Fixed-window rate limiting.
//!
//! A window for a key opens on the first consume and resets `window_secs`
//! later. Within a window at most `max` consumes succeed; a rejected consume
//! leaves the count unchanged.
//!
//! Two implementations share the [`RateLimiter`] trait:
//! - [`FixedWindowLimiter`]: process-local, lost on restart.
//! - [`StoreLimiter`]: backed by a [`CounterStore`], shared by every process
//!   using the same database.

use std::collections::HashMap;
use std::sync::Mutex;

use vouch_store::{CounterStore, WindowDecision};
use vouch_types::{Clock, Timestamp, VouchError};

/// Outcome of a consume attempt.
pub type RateDecision = WindowDecision;

/// Per-key fixed-window limiter.
pub trait RateLimiter: Send + Sync {
    /// Atomically check and consume one unit for `key`.
    fn try_consume(&self, key: &str, max: u32, window_secs: u64)
        -> Result<RateDecision, VouchError>;

    /// Drop windows that have already reset. Returns how many were dropped.
    fn purge_expired(&self) -> Result<usize, VouchError>;
}

#[derive(Clone, Copy, Debug)]
struct Window {
    count: u32,
    reset_at: Timestamp,
}

/// In-memory fixed-window limiter.
pub struct FixedWindowLimiter<C: Clock> {
    clock: C,
    windows: Mutex<HashMap<String, Window>>,
}

impl<C: Clock> FixedWindowLimiter<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Window>>, VouchError> {
        self.windows
            .lock()
            .map_err(|_| VouchError::Internal("rate limiter lock poisoned".into()))
    }

    /// Number of live windows, for diagnostics.
    pub fn tracked_keys(&self) -> usize {
        self.lock().map(|w| w.len()).unwrap_or(0)
    }
}

impl<C: Clock> RateLimiter for FixedWindowLimiter<C> {
    fn try_consume(
        &self,
        key: &str,
        max: u32,
        window_secs: u64,
    ) -> Result<RateDecision, VouchError> {
        let now = self.clock.now();
        let mut windows = self.lock()?;
        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now.plus(window_secs),
        });
        if window.reset_at <= now {
            *window = Window {
                count: 0,
                reset_at: now.plus(window_secs),
            };
        }
        if window.count >= max {
            tracing::debug!(key, max, "rate limit reached");
            return Ok(RateDecision {
                allowed: false,
                remaining: 0,
            });
        }
        window.count += 1;
        Ok(RateDecision {
            allowed: true,
            remaining: max - window.count,
        })
    }

    fn purge_expired(&self) -> Result<usize, VouchError> {
        let now = self.clock.now();
        let mut windows = self.lock()?;
        let before = windows.len();
        windows.retain(|_, w| w.reset_at > now);
        Ok(before - windows.len())
    }
}

/// Limiter whose windows live in a [`CounterStore`].
pub struct StoreLimiter<S, C> {
    store: S,
    clock: C,
}

impl<S, C> StoreLimiter<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }
}

impl<S, C> RateLimiter for StoreLimiter<S, C>
where
    S: CounterStore + Send + Sync,
    C: Clock,
{
    fn try_consume(
        &self,
        key: &str,
        max: u32,
        window_secs: u64,
    ) -> Result<RateDecision, VouchError> {
        let decision = self
            .store
            .consume_window(key, max, window_secs, self.clock.now())?;
        if !decision.allowed {
            tracing::debug!(key, max, "rate limit reached");
        }
        Ok(decision)
    }

    fn purge_expired(&self) -> Result<usize, VouchError> {
        Ok(self.store.purge_expired_windows(self.clock.now())?)
    }
}

/// Limiter key for helpfulness votes by one voter.
pub fn vote_key(voter: &str) -> String {
    format!("vote:{voter}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vouch_nullables::NullClock;

    #[test]
    fn allows_up_to_max_then_rejects() {
        let limiter = FixedWindowLimiter::new(NullClock::new(0));
        for i in 0..50 {
            let d = limiter.try_consume("vote:u", 50, 86_400).unwrap();
            assert!(d.allowed, "consume {i} rejected");
            assert_eq!(d.remaining, 49 - i);
        }
        let d = limiter.try_consume("vote:u", 50, 86_400).unwrap();
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);
    }

    #[test]
    fn rejection_does_not_extend_the_window() {
        let clock = NullClock::new(0);
        let limiter = FixedWindowLimiter::new(clock.clone());
        assert!(limiter.try_consume("k", 1, 10).unwrap().allowed);
        clock.advance(5);
        assert!(!limiter.try_consume("k", 1, 10).unwrap().allowed);
        clock.advance(5);
        assert!(limiter.try_consume("k", 1, 10).unwrap().allowed);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = FixedWindowLimiter::new(NullClock::new(0));
        assert!(limiter.try_consume("a", 1, 10).unwrap().allowed);
        assert!(!limiter.try_consume("a", 1, 10).unwrap().allowed);
        assert!(limiter.try_consume("b", 1, 10).unwrap().allowed);
    }

    #[test]
    fn purge_drops_only_reset_windows() {
        let clock = NullClock::new(0);
        let limiter = FixedWindowLimiter::new(clock.clone());
        limiter.try_consume("short", 5, 10).unwrap();
        limiter.try_consume("long", 5, 100).unwrap();
        clock.advance(10);
        assert_eq!(limiter.purge_expired().unwrap(), 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn concurrent_consumers_never_exceed_max() {
        let limiter = Arc::new(FixedWindowLimiter::new(NullClock::new(0)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.try_consume("shared", 50, 60).unwrap().allowed)
                        .count()
                })
            })
            .collect();
        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }
}
