//! Diagnostic output stream
//!
//! The controller reports what it does as a sequence of human-readable
//! lines, one [`Diagnostic`] record per line:
//!
//! ```text
//! New:    57.3                      one per generated reading
//! Stale:  41 46                     one per insertion cycle (may be empty)
//! List:   33 57 70 81               one per insertion cycle
//! Median: 63.7 - Alert duration 412 one per insertion cycle
//!     Warning On                    one per actuator transition
//! ```
//!
//! Emission is best-effort: a [`Diagnostics`] handle may have no sink at all
//! and the computation proceeds identically.

mod console;
mod memory;

use std::fmt;
use std::sync::Arc;

use tracing::trace;

pub use console::ConsoleSink;
pub use memory::MemorySink;

/// One line of diagnostic output
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A reading was generated by the pulse source
    New { value: f64 },

    /// Readings evicted from the window before an insertion
    Stale { values: Vec<f64> },

    /// Window contents after an insertion, ascending
    List { values: Vec<f64> },

    /// Median of the window, plus the over-threshold duration when the
    /// median is above the threshold
    Median {
        median: f64,
        alert_duration_ms: Option<u64>,
    },

    /// Actuator entered the ON state
    WarningOn,

    /// Actuator entered the OFF state
    WarningOff,
}

impl Diagnostic {
    /// Short category tag, used for structured logging and tests
    pub fn category(&self) -> &'static str {
        match self {
            Diagnostic::New { .. } => "new",
            Diagnostic::Stale { .. } => "stale",
            Diagnostic::List { .. } => "list",
            Diagnostic::Median { .. } => "median",
            Diagnostic::WarningOn => "warning_on",
            Diagnostic::WarningOff => "warning_off",
        }
    }
}

fn write_values(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    for value in values {
        // window listings are printed truncated, like the readings on a gauge
        write!(f, " {}", value.trunc() as i64)?;
    }
    Ok(())
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::New { value } => write!(f, "New:   {value:5.1}"),
            Diagnostic::Stale { values } => {
                write!(f, "Stale: ")?;
                write_values(f, values)
            }
            Diagnostic::List { values } => {
                write!(f, "List:  ")?;
                write_values(f, values)
            }
            Diagnostic::Median {
                median,
                alert_duration_ms,
            } => {
                write!(f, "Median:{median:5.1}")?;
                if let Some(duration) = alert_duration_ms {
                    write!(f, " - Alert duration {duration}")?;
                }
                Ok(())
            }
            Diagnostic::WarningOn => write!(f, "\tWarning On"),
            Diagnostic::WarningOff => write!(f, "\tWarning Off"),
        }
    }
}

/// Destination for diagnostic records
///
/// Implementations serialize concurrent writers themselves so that lines
/// from different tasks never interleave.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, record: &Diagnostic);
}

/// Cloneable, optional handle to a [`DiagnosticSink`]
#[derive(Clone, Default)]
pub struct Diagnostics {
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl Diagnostics {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Handle that drops every record
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn emit(&self, record: Diagnostic) {
        trace!(category = record.category(), "{record}");

        if let Some(sink) = &self.sink {
            sink.emit(&record);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
