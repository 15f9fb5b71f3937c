//! In-memory diagnostic sink
//!
//! Keeps every record in emission order. Useful for tests and for embedding
//! the controller where the caller inspects the stream afterwards.

use std::sync::Mutex;

use super::{Diagnostic, DiagnosticSink};

#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records emitted so far
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records of the given category (see [`Diagnostic::category`])
    pub fn count(&self, category: &str) -> usize {
        self.records
            .lock()
            .map(|records| {
                records
                    .iter()
                    .filter(|record| record.category() == category)
                    .count()
            })
            .unwrap_or(0)
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, record: &Diagnostic) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}
