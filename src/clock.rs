//! Monotonic millisecond time source
//!
//! Every component stamps readings and checks timeouts against a [`Clock`].
//! The production clock is backed by [`tokio::time::Instant`], which means
//! tests running with paused time see the same virtual timeline as the
//! `tokio::time::sleep` calls inside the workers.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Instant;

/// Source of monotonic timestamps in milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Milliseconds elapsed since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) -> u64 {
        self.now.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Returns true once `limit_ms` or more has passed between `start_ms` and `now_ms`
pub fn is_timeout(now_ms: u64, start_ms: u64, limit_ms: u64) -> bool {
    now_ms.saturating_sub(start_ms) >= limit_ms
}
