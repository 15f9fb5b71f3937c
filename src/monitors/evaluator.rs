//! AlertEvaluator - turns the window median into a debounced alert
//!
//! ## Debounce
//!
//! ```text
//! median <= threshold:
//!   alert_since = now, alert = false
//!
//! median > threshold:
//!   now - alert_since <  debounce  → alert = false (pending)
//!   now - alert_since >= debounce  → alert = true
//! ```
//!
//! `alert_since` therefore marks the last moment the condition was false,
//! i.e. the start of the current continuous over-threshold run. A spike that
//! drops back below the threshold before the debounce elapses never raises
//! the alert.

use tracing::{debug, instrument, trace, warn};

use crate::Reading;
use crate::clock::is_timeout;
use crate::config::AlertConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};

use super::window::SampleWindow;

/// Debounce state, mutated only by [`AlertEvaluator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertState {
    /// Whether the debounced alert currently holds
    pub alert_active: bool,

    /// Last time the median was at or below the threshold
    pub alert_since_ms: u64,
}

/// Outcome of one evaluation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub median: f64,

    /// `median > threshold`
    pub over_threshold: bool,

    /// How long the median has been over the threshold, if it is
    pub over_threshold_ms: Option<u64>,

    /// Debounced alert flag
    pub alert: bool,
}

#[derive(Debug)]
pub struct AlertEvaluator {
    window: SampleWindow,
    threshold: f64,
    debounce_ms: u64,
    state: AlertState,
    diagnostics: Diagnostics,
}

impl AlertEvaluator {
    /// Create an evaluator whose first over-threshold run is measured from `now_ms`
    pub fn new(config: &AlertConfig, now_ms: u64, diagnostics: Diagnostics) -> Self {
        Self {
            window: SampleWindow::new(config.retention_ms),
            threshold: config.threshold,
            debounce_ms: config.debounce_ms,
            state: AlertState {
                alert_active: false,
                alert_since_ms: now_ms,
            },
            diagnostics,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Consume one reading: age out the window, insert, and re-evaluate
    ///
    /// Emits one `Stale`, one `List` and one `Median` record, in that order.
    #[instrument(skip(self), fields(value = reading.value))]
    pub fn observe(&mut self, reading: Reading, now_ms: u64) -> Evaluation {
        let evicted = self.window.evict_stale(reading.timestamp_ms);
        self.diagnostics.emit(Diagnostic::Stale {
            values: evicted.iter().map(|entry| entry.value).collect(),
        });

        if let Err(e) = self.window.insert(reading) {
            warn!("window is full, skipping reading: {e}");
        }
        self.diagnostics.emit(Diagnostic::List {
            values: self.window.values(),
        });

        let median = self.window.median();
        let evaluation = self.evaluate(median, now_ms);

        self.diagnostics.emit(Diagnostic::Median {
            median,
            alert_duration_ms: evaluation.over_threshold_ms,
        });

        evaluation
    }

    /// Apply the threshold and debounce to a median observed at `now_ms`
    pub fn evaluate(&mut self, median: f64, now_ms: u64) -> Evaluation {
        let over_threshold = median > self.threshold;

        if !over_threshold {
            if self.state.alert_active {
                debug!("median {median:.1} back below threshold {}", self.threshold);
            }
            self.state = AlertState {
                alert_active: false,
                alert_since_ms: now_ms,
            };

            return Evaluation {
                median,
                over_threshold,
                over_threshold_ms: None,
                alert: false,
            };
        }

        let elapsed = now_ms.saturating_sub(self.state.alert_since_ms);
        let alert = is_timeout(now_ms, self.state.alert_since_ms, self.debounce_ms);

        if alert && !self.state.alert_active {
            debug!(
                "median {median:.1} above threshold {} for {elapsed}ms, raising alert",
                self.threshold
            );
        }
        self.state.alert_active = alert;

        trace!(
            "median {median:.1} (max: {}) over threshold for {elapsed}/{}ms",
            self.threshold, self.debounce_ms
        );

        Evaluation {
            median,
            over_threshold,
            over_threshold_ms: Some(elapsed),
            alert,
        }
    }
}
