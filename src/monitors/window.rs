//! Sliding time window of readings, ordered by value
//!
//! The window keeps every reading of the last `retention_ms` milliseconds,
//! sorted ascending by derived value so the median is a direct index.
//! Eviction is by age (timestamp), which is independent of the sort order,
//! so it is a single `retain` pass over the whole window.
//!
//! ## Invariants
//!
//! - entries are in ascending value order (equal values keep insertion order)
//! - after `evict_stale(now)`, every entry satisfies
//!   `timestamp + retention_ms >= now`

use std::collections::TryReserveError;

use crate::Reading;

/// Default retention span (milliseconds)
pub const DEFAULT_RETENTION_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct SampleWindow {
    entries: Vec<Reading>,
    retention_ms: u64,
}

impl SampleWindow {
    pub fn new(retention_ms: u64) -> Self {
        Self {
            entries: Vec::new(),
            retention_ms,
        }
    }

    /// Insert a reading, keeping ascending value order
    ///
    /// Fails only when the window cannot grow; the window is left unchanged
    /// in that case.
    pub fn insert(&mut self, reading: Reading) -> Result<(), TryReserveError> {
        self.entries.try_reserve(1)?;

        let index = self
            .entries
            .partition_point(|entry| entry.value.total_cmp(&reading.value).is_le());
        self.entries.insert(index, reading);

        Ok(())
    }

    /// Remove every reading older than the retention span relative to `now_ms`
    ///
    /// Returns the evicted readings in value order.
    pub fn evict_stale(&mut self, now_ms: u64) -> Vec<Reading> {
        let retention_ms = self.retention_ms;
        let mut evicted = Vec::new();

        self.entries.retain(|entry| {
            if entry.is_stale(now_ms, retention_ms) {
                evicted.push(*entry);
                false
            } else {
                true
            }
        });

        evicted
    }

    /// Median of the retained values, `0.0` for an empty window
    pub fn median(&self) -> f64 {
        let len = self.entries.len();
        if len == 0 {
            return 0.0;
        }

        let middle = len / 2;
        if len % 2 == 1 {
            self.entries[middle].value
        } else {
            (self.entries[middle - 1].value + self.entries[middle].value) / 2.0
        }
    }

    /// Retained values in ascending order
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.value).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_MS)
    }
}
