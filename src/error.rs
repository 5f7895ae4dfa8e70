use thiserror::Error;
use tracing::{error, warn};

/// Domain-specific errors for clipstack
#[derive(Error, Debug)]
pub enum ClipstackError {
    #[error("Storage operation failed: {0}")]
    Storage(String),

    #[error("Clipboard read failed: {0}")]
    ClipboardRead(String),

    #[error("Clipboard write failed: {0}")]
    ClipboardWrite(String),

    #[error("Foreground application query failed: {0}")]
    ForegroundQuery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse custom detection rule: {0}")]
    RuleParse(#[from] regex::Error),
}

#[allow(dead_code)]
pub type Result<T> = std::result::Result<T, ClipstackError>;

/// Extension trait for ergonomic error logging
pub trait ResultExt<T> {
    /// Log the error at `error` level and convert to Option.
    fn log_err(self) -> Option<T>;
    /// Log the error at `warn` level and convert to Option.
    /// Use for expected, recoverable failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    fn log_err(self) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                error!(error = ?e, "Operation failed");
                None
            }
        }
    }

    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = ?e, "Operation warning");
                None
            }
        }
    }
}
