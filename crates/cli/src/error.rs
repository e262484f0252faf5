//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Trace file not found
    #[error("Trace file not found: {path}")]
    TraceNotFound { path: String },

    /// Replay speed out of range
    #[error("Invalid replay speed {speed}: must be finite and >= 0")]
    InvalidSpeed { speed: f64 },

    /// Replay aborted
    #[error("Replay failed: {message}")]
    Replay { message: String },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn trace_not_found(path: &Path) -> Self {
        Self::TraceNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn replay(message: impl Into<String>) -> Self {
        Self::Replay {
            message: message.into(),
        }
    }
}
