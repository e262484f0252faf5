//! AlignmentSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{Alignment, ContractError};

/// Alignment output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(AlignmentSink: Send)]
pub trait LocalAlignmentSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write an emitted alignment
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, alignment: &Alignment) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
