//! Errors raised at crate boundaries.
//!
//! Noise rejection is not an error; see `NodeOutcome` in `sync_engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    /// Session configuration text is not valid TOML / JSON
    #[error("malformed {format} session config: {message}")]
    MalformedConfig {
        format: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File extension names no supported configuration format
    #[error("unsupported config format: .{extension}")]
    UnsupportedFormat { extension: String },

    /// Numeric setting outside its accepted range
    #[error("'{field}' = {value} is out of range, expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// Sink declaration rejected before any alignment is dispatched
    #[error("sink '{sink}' is misconfigured: {message}")]
    InvalidSink { sink: String, message: String },

    /// Sink failed to persist one alignment
    #[error("sink '{sink}' could not write alignment #{sequence}: {message}")]
    AlignmentWrite {
        sink: String,
        sequence: u64,
        message: String,
    },

    /// Sink failed to flush buffered alignments
    #[error("sink '{sink}' could not flush: {message}")]
    SinkFlush { sink: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    pub fn out_of_range(field: &'static str, value: f64, expected: &'static str) -> Self {
        Self::OutOfRange {
            field,
            value,
            expected,
        }
    }

    pub fn invalid_sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSink {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn alignment_write(sink: impl Into<String>, sequence: u64, message: impl ToString) -> Self {
        Self::AlignmentWrite {
            sink: sink.into(),
            sequence,
            message: message.to_string(),
        }
    }

    pub fn sink_flush(sink: impl Into<String>, message: impl ToString) -> Self {
        Self::SinkFlush {
            sink: sink.into(),
            message: message.to_string(),
        }
    }

    /// True for errors caused by configuration rather than runtime IO
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::MalformedConfig { .. }
                | Self::UnsupportedFormat { .. }
                | Self::OutOfRange { .. }
                | Self::InvalidSink { .. }
        )
    }
}
