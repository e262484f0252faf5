//! Pipeline orchestrator - drives a trace through a session into the dispatcher.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{Alignment, SessionBlueprint, Vector3};
use ingestion::{SessionOutcome, SynchronizationSession, TraceEvent, TraceReader};
use observability::{record_alignment_dispatched, record_alignment_emitted, record_replay_lag_ms};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The session configuration
    pub blueprint: SessionBlueprint,

    /// Trace to replay
    pub trace_path: PathBuf,

    /// Replay speed multiplier (None = as fast as possible)
    pub speed: Option<f64>,

    /// Stop after this many accepted alignments (None = unlimited)
    pub max_alignments: Option<u64>,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Replay pipeline
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Replay the trace until it ends, the alignment limit is hit, or
    /// `shutdown` flips to true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_exporter(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let reader = TraceReader::open(&self.config.trace_path).with_context(|| {
            format!("Failed to open trace {}", self.config.trace_path.display())
        })?;

        // Dispatcher
        let (alignment_tx, alignment_rx) =
            mpsc::channel::<Alignment>(self.config.buffer_size.max(1));

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - alignments will only be counted");
        }

        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), alignment_rx)
            .await
            .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();

        // Session
        let mut session = SynchronizationSession::new(blueprint.synchronization)
            .context("Invalid synchronization settings")?;

        let dropped = Arc::new(AtomicU64::new(0));
        let listener_dropped = Arc::clone(&dropped);
        session.subscribe(move |alignment| {
            record_alignment_emitted(alignment);
            let delivered = alignment_tx.try_send(*alignment).is_ok();
            if !delivered {
                listener_dropped.fetch_add(1, Ordering::Relaxed);
            }
            record_alignment_dispatched("dispatcher", delivered);
        });

        if let Some(anchor) = blueprint.map {
            session.on_map_initialized(anchor, Vector3::zero());
        }

        info!(
            trace = %self.config.trace_path.display(),
            speed = ?self.config.speed,
            max_alignments = ?self.config.max_alignments,
            "Replay started"
        );

        let mut stats = PipelineStats {
            active_sinks: blueprint.sinks.len(),
            ..Default::default()
        };
        let mut first_timestamp = None;
        let replay_start = Instant::now();

        for event in reader {
            if *shutdown.borrow() {
                stats.interrupted = true;
                break;
            }

            let event = event
                .map_err(|e| CliError::replay(e.to_string()))
                .context("Trace decoding failed")?;
            stats.events += 1;

            if let Some(speed) = self.config.speed {
                let t0 = *first_timestamp.get_or_insert(event.timestamp());
                let target = pacing_target(event.timestamp() - t0, speed)
                    .context("Trace pacing failed")?;
                let elapsed = replay_start.elapsed();
                if let Some(wait) = target.checked_sub(elapsed) {
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {}
                        Ok(()) = shutdown.changed() => {
                            stats.interrupted = true;
                            break;
                        }
                    }
                } else {
                    record_replay_lag_ms((elapsed - target).as_secs_f64() * 1000.0);
                }
            }

            let outcome = self.apply(&mut session, &event, &mut stats)?;
            if let Some(SessionOutcome::Node(node)) = outcome {
                stats.alignment_metrics.update(&node);
            }

            if let Some(max) = self.config.max_alignments {
                if session.stats().accepted >= max {
                    info!(alignments = max, "Reached max alignments limit");
                    break;
                }
            }
        }

        stats.context = session.stats();
        stats.final_alignment = session.alignment();
        stats.alignments_dropped = dropped.load(Ordering::Relaxed);

        // Dropping the session drops the listener and closes the channel
        drop(session);

        info!("Waiting for sinks to flush...");
        match tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await {
            Ok(Ok(sink_metrics)) => stats.sink_metrics = sink_metrics,
            Ok(Err(e)) => warn!(error = %e, "Dispatcher task failed"),
            Err(_) => warn!("Dispatcher did not finish within 5s"),
        }

        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            events = stats.events,
            accepted = stats.context.accepted,
            "Replay complete"
        );

        Ok(stats)
    }

    /// Route one trace event to the session
    fn apply(
        &self,
        session: &mut SynchronizationSession,
        event: &TraceEvent,
        stats: &mut PipelineStats,
    ) -> Result<Option<SessionOutcome>> {
        let outcome = match event {
            TraceEvent::MapInitialized { ar_position, .. } => {
                stats.map_events += 1;
                let anchor = event
                    .anchor(self.config.blueprint.map.as_ref())?
                    .ok_or_else(|| CliError::replay("map event without anchor"))?;
                config_loader::validate_map_anchor(&anchor)
                    .context("Invalid map anchor in trace")?;
                session.on_map_initialized(anchor, *ar_position)
            }
            TraceEvent::Location { ar_position, .. } => {
                stats.locations += 1;
                let Some(location) = event.location() else {
                    return Ok(None);
                };
                Some(session.on_location_updated(&location, *ar_position))
            }
            TraceEvent::Plane { height, .. } => {
                stats.plane_events += 1;
                session.on_plane_detected(*height);
                None
            }
        };

        match &outcome {
            Some(SessionOutcome::Deferred) => stats.deferred += 1,
            Some(SessionOutcome::Ignored) => stats.ignored += 1,
            Some(SessionOutcome::Node(node)) => {
                debug!(accepted = node.is_accepted(), "node evaluated");
            }
            None => {}
        }

        Ok(outcome)
    }
}

/// Wall-clock offset at which an event `gap` seconds into the trace is due
fn pacing_target(gap: f64, speed: f64) -> Result<Duration, CliError> {
    Duration::try_from_secs_f64((gap / speed).max(0.0)).map_err(|e| {
        CliError::replay(format!(
            "cannot pace trace gap of {gap}s at speed {speed}: {e}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GeoCoordinate, MapAnchor, SinkConfig, SinkType};
    use std::collections::HashMap;
    use std::io::Write;

    const TRACE: &str = r#"{"event":"location","timestamp":0.0,"latitude":0.0,"longitude":0.0,"ar_position":{"x":0.0,"y":0.0,"z":0.0}}
{"event":"map_initialized","timestamp":0.1,"center":{"latitude":0.0,"longitude":0.0}}
{"event":"plane","timestamp":0.2,"height":-1.5}
{"event":"location","timestamp":0.3,"latitude":0.0,"longitude":0.00001,"ar_position":{"x":0.0,"y":0.0,"z":0.0}}
{"event":"location","timestamp":0.4,"latitude":0.0,"longitude":0.0001,"is_location_updated":false,"ar_position":{"x":0.0,"y":0.0,"z":0.0}}
{"event":"location","timestamp":0.5,"latitude":0.0,"longitude":0.0001,"ar_position":{"x":9.0,"y":0.0,"z":0.0}}
"#;

    fn config(trace_path: PathBuf, output: PathBuf) -> PipelineConfig {
        let mut blueprint = SessionBlueprint::new("test");
        blueprint.sinks.push(SinkConfig {
            name: "file".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 16,
            params: HashMap::from([("path".to_string(), output.display().to_string())]),
        });
        PipelineConfig {
            blueprint,
            trace_path,
            speed: None,
            max_alignments: None,
            buffer_size: 16,
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_replay_trace_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("trace.jsonl");
        std::fs::File::create(&trace_path)
            .unwrap()
            .write_all(TRACE.as_bytes())
            .unwrap();
        let output = dir.path().join("alignments.jsonl");

        let (_tx, rx) = watch::channel(false);
        let stats = Pipeline::new(config(trace_path, output.clone()))
            .run(rx)
            .await
            .unwrap();

        assert_eq!(stats.events, 6);
        assert_eq!(stats.deferred, 1);
        assert_eq!(stats.ignored, 1);
        // replayed bootstrap + east move; the ~1.1 m step is rejected
        assert_eq!(stats.context.accepted, 2);
        assert_eq!(stats.context.rejected_movement, 1);
        assert!(!stats.interrupted);

        let lines: Vec<Alignment> = std::fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].position.y, 0.0);
        assert_eq!(lines[1].position.y, -1.5);
        assert_eq!(stats.sink_metrics[0].1.write_count, 2);
        assert_eq!(stats.sink_metrics[0].1.last_sequence, Some(2));
    }

    #[tokio::test]
    async fn test_max_alignments_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("trace.jsonl");
        std::fs::write(&trace_path, TRACE).unwrap();

        let mut config = config(trace_path, dir.path().join("out.jsonl"));
        config.max_alignments = Some(1);
        config.blueprint.map = Some(MapAnchor::new(GeoCoordinate::new(0.0, 0.0), 1.0));

        let (_tx, rx) = watch::channel(false);
        let stats = Pipeline::new(config).run(rx).await.unwrap();
        assert_eq!(stats.events, 1);
        assert_eq!(stats.context.accepted, 1);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_replay() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("trace.jsonl");
        std::fs::write(&trace_path, TRACE).unwrap();

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let stats = Pipeline::new(config(trace_path, dir.path().join("out.jsonl")))
            .run(rx)
            .await
            .unwrap();
        assert!(stats.interrupted);
        assert_eq!(stats.events, 0);
    }

    #[test]
    fn test_pacing_target() {
        assert_eq!(pacing_target(3.0, 2.0).unwrap(), Duration::from_millis(1500));
        assert_eq!(pacing_target(-1.0, 1.0).unwrap(), Duration::ZERO);
        assert!(pacing_target(1e30, 1.0).is_err());
        assert!(pacing_target(1.0, 1e-300).is_err());
    }

    #[tokio::test]
    async fn test_unpaceable_timestamp_gap_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("trace.jsonl");
        std::fs::write(
            &trace_path,
            "{\"event\":\"plane\",\"timestamp\":0.0,\"height\":0.0}\n\
             {\"event\":\"plane\",\"timestamp\":1e30,\"height\":0.0}\n",
        )
        .unwrap();

        let mut config = config(trace_path, dir.path().join("out.jsonl"));
        config.speed = Some(1.0);

        let (_tx, rx) = watch::channel(false);
        let err = Pipeline::new(config).run(rx).await.unwrap_err();
        assert!(format!("{err:#}").contains("cannot pace trace gap"), "got: {err:#}");
    }

    #[tokio::test]
    async fn test_trace_parse_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("trace.jsonl");
        std::fs::write(&trace_path, "{\"event\":\"unknown\"}\n").unwrap();

        let (_tx, rx) = watch::channel(false);
        let err = Pipeline::new(config(trace_path, dir.path().join("out.jsonl")))
            .run(rx)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("trace line 1"));
    }
}
