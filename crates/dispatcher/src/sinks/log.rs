//! LogSink - logs alignments via tracing

use contracts::{Alignment, AlignmentSink, ContractError};
use tracing::{info, instrument};

/// Sink that logs every alignment
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl AlignmentSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, alignment),
        fields(sink = %self.name, sequence = alignment.sequence)
    )]
    async fn write(&mut self, alignment: &Alignment) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            sequence = alignment.sequence,
            position = %alignment.position,
            rotation = alignment.rotation,
            bias = alignment.bias,
            "Alignment received"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Vector3;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let alignment = Alignment::from_offset(Vector3::new(1.0, 0.0, 2.0));

        let result = sink.write(&alignment).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
