//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// A trace line could not be decoded
    #[error("trace line {line}: {message}")]
    TraceParse {
        /// 1-based line number
        line: usize,
        /// Decoder message
        message: String,
    },

    /// Map initialised without an anchor and none configured
    #[error("map initialised without an anchor and no [map] section configured")]
    MissingMapAnchor,

    /// Invalid configuration or anchor
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
