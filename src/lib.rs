pub mod actors;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod monitors;
pub mod util;

/// One timestamped measurement
///
/// Produced by the pulse source and moved through the mailbox into the
/// sample window; never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Measured pulse width (milliseconds)
    pub width_ms: u16,

    /// Derived value (temperature equivalent)
    pub value: f64,

    /// Monotonic time at which the pulse completed (milliseconds)
    pub timestamp_ms: u64,
}

impl Reading {
    /// Whether the reading is older than `retention_ms` at `now_ms`
    pub fn is_stale(&self, now_ms: u64, retention_ms: u64) -> bool {
        self.timestamp_ms.saturating_add(retention_ms) < now_ms
    }
}
