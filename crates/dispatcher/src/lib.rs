//! # Dispatcher
//!
//! Alignment distribution module.
//!
//! Responsibilities:
//! - Consume emitted `Alignment` values
//! - Fan-out to multiple sinks
//! - Isolate slow sinks so they never block the session; a lagging sink
//!   skips to the newest alignment instead of replaying every one

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{Alignment, AlignmentSink};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::{Admission, SinkHandle};
pub use metrics::{Delivery, MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, LogSink};
