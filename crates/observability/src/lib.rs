//! # Observability
//!
//! Log subscriber setup, the Prometheus exporter for the `ar_sync_*` /
//! `ar_session_*` metrics, and in-process alignment summaries.
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     metrics_port: Some(9000),
//!     ..Default::default()
//! })?;
//!
//! if let NodeOutcome::Accepted(alignment) = context.add_node(node) {
//!     observability::record_alignment_emitted(&alignment);
//! }
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

pub use crate::metrics::{
    record_alignment_dispatched, record_alignment_emitted, record_replay_lag_ms,
    AlignmentMetricsAggregator, MetricsSummary, RunningStats, StatsSummary,
};

/// Histogram buckets for the blend factor, which lives in [0, 1]
pub const BIAS_BUCKETS: &[f64] = &[0.0, 0.05, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];

/// Histogram buckets for per-node alignment corrections, in metres
pub const CORRECTION_BUCKETS_M: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0];

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus port (None = no exporter)
    pub metrics_port: Option<u16>,
    /// Filter used when `RUST_LOG` is unset
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    fn layer(self) -> Box<dyn Layer<Registry> + Send + Sync> {
        match self {
            Self::Json => fmt::layer()
                .json()
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            Self::Pretty => fmt::layer().pretty().boxed(),
            Self::Compact => fmt::layer().compact().with_target(false).boxed(),
        }
    }
}

/// Install the global subscriber and, if a port is set, the exporter
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    tracing_subscriber::registry()
        .with(config.log_format.layer())
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_exporter(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );
    Ok(())
}

/// Serve alignment metrics on `0.0.0.0:<port>/metrics`
pub fn init_metrics_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .set_buckets_for_metric(Matcher::Full("ar_sync_bias".to_string()), BIAS_BUCKETS)
        .context("Invalid bias buckets")?
        .set_buckets_for_metric(
            Matcher::Full("ar_sync_alignment_correction_m".to_string()),
            CORRECTION_BUCKETS_M,
        )
        .context("Invalid correction buckets")?
        .install()
        .context("Failed to install Prometheus recorder")?;

    crate::metrics::describe();
    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}
