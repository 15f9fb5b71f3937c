use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing::{debug, warn};

use crate::error::ControllerResult;
use crate::util::log_file_name;

use super::{Diagnostic, DiagnosticSink};

/// Writes diagnostic lines to stdout and, optionally, a log file
///
/// The inner mutex is the print lock: every line is written while holding
/// it, so lines from the producer, coordinator and actuator never interleave.
pub struct ConsoleSink {
    output: Mutex<ConsoleOutput>,
    log_path: Option<PathBuf>,
}

struct ConsoleOutput {
    stdout: bool,
    log_file: Option<BufWriter<File>>,
}

impl ConsoleSink {
    /// Sink that only writes to stdout
    pub fn stdout() -> Self {
        Self {
            output: Mutex::new(ConsoleOutput {
                stdout: true,
                log_file: None,
            }),
            log_path: None,
        }
    }

    /// Sink that writes to stdout and a fresh `log_<timestamp>.txt` in `directory`
    pub fn with_log_file(directory: &Path) -> ControllerResult<Self> {
        let path = directory.join(log_file_name(Local::now()));
        let file = File::create(&path)?;
        debug!("writing diagnostics to {}", path.display());

        Ok(Self {
            output: Mutex::new(ConsoleOutput {
                stdout: true,
                log_file: Some(BufWriter::new(file)),
            }),
            log_path: Some(path),
        })
    }

    /// Sink that only writes to the given file
    pub fn file_only(path: &Path) -> ControllerResult<Self> {
        let file = File::create(path)?;

        Ok(Self {
            output: Mutex::new(ConsoleOutput {
                stdout: false,
                log_file: Some(BufWriter::new(file)),
            }),
            log_path: Some(path.to_path_buf()),
        })
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Flush buffered log file output
    pub fn flush(&self) {
        let Ok(mut output) = self.output.lock() else {
            warn!("print lock poisoned, log file not flushed");
            return;
        };

        if let Some(file) = output.log_file.as_mut()
            && let Err(e) = file.flush()
        {
            warn!("failed to flush log file: {e}");
        }
    }
}

impl DiagnosticSink for ConsoleSink {
    fn emit(&self, record: &Diagnostic) {
        let Ok(mut output) = self.output.lock() else {
            warn!("print lock poisoned, dropping {} record", record.category());
            return;
        };

        if output.stdout {
            let _ = writeln!(io::stdout().lock(), "{record}");
        }

        let failed = match output.log_file.as_mut() {
            Some(file) => writeln!(file, "{record}").err(),
            None => None,
        };
        if let Some(e) = failed {
            warn!("failed to write log file, disabling it: {e}");
            output.log_file = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_only_sink_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diag.txt");

        let sink = ConsoleSink::file_only(&path).unwrap();
        sink.emit(&Diagnostic::New { value: 40.0 });
        sink.emit(&Diagnostic::WarningOn);
        sink.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "New:    40.0\n\tWarning On\n");
    }

    #[test]
    fn test_log_file_is_created_in_directory() {
        let dir = tempfile::tempdir().unwrap();

        let sink = ConsoleSink::with_log_file(dir.path()).unwrap();
        let path = sink.log_path().unwrap().to_path_buf();
        drop(sink);

        assert!(path.starts_with(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("log_"));
        assert!(name.ends_with(".txt"));
        assert!(path.exists());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does/not/exist");

        assert!(ConsoleSink::with_log_file(&missing).is_err());
    }
}
