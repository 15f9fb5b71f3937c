//! Error types for the controller

use std::fmt;

/// Result type alias for controller operations
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors that can stop the controller
#[derive(Debug)]
pub enum ControllerError {
    /// Configuration values are inconsistent or out of range
    InvalidConfig(String),

    /// A shared lock was poisoned by a panicking holder
    ///
    /// Carries the name of the lock domain (`"mailbox"`, `"alert flag"`).
    LockPoisoned(&'static str),

    /// A worker task panicked or was aborted
    WorkerFailed(String),

    /// I/O error (log file access, etc.)
    Io(std::io::Error),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            ControllerError::LockPoisoned(domain) => {
                write!(f, "{} lock poisoned, cannot continue", domain)
            }
            ControllerError::WorkerFailed(msg) => write!(f, "worker task failed: {}", msg),
            ControllerError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ControllerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControllerError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ControllerError {
    fn from(err: std::io::Error) -> Self {
        ControllerError::Io(err)
    }
}

impl From<tokio::task::JoinError> for ControllerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ControllerError::WorkerFailed(err.to_string())
    }
}
