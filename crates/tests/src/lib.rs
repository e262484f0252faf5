//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Alignment behaviour through the public API
//! - Configuration file to running context
//! - Trace -> session -> dispatcher -> file sink

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{SynchronizationConfig, Vector3};
    use sync_engine::{NodeOutcome, RejectionReason, SynchronizationContext};

    fn context(config: SynchronizationConfig) -> SynchronizationContext {
        SynchronizationContext::new(config).unwrap()
    }

    #[test]
    fn test_walkthrough_scenario() {
        let mut ctx = context(SynchronizationConfig::default());

        let first = ctx.add_synchronization_node(Vector3::zero(), Vector3::zero());
        assert_eq!(first.alignment().unwrap().position, Vector3::zero());

        let second = ctx.add_synchronization_node(Vector3::new(5.0, 0.0, 0.0), Vector3::zero());
        assert_eq!(
            second.alignment().unwrap().position,
            Vector3::new(5.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_gates_leave_state_untouched() {
        let mut ctx = context(SynchronizationConfig::default());
        ctx.add_synchronization_node(Vector3::zero(), Vector3::zero());
        let before = ctx.alignment();

        let small = ctx.add_synchronization_node(Vector3::new(1.0, 0.0, 0.0), Vector3::zero());
        assert!(matches!(
            small,
            NodeOutcome::Rejected(RejectionReason::InsufficientMovement { .. })
        ));

        let drift = ctx.add_synchronization_node(
            Vector3::new(5.0, 0.0, 0.0),
            Vector3::new(15.0, 0.0, 0.0),
        );
        assert!(matches!(
            drift,
            NodeOutcome::Rejected(RejectionReason::ArDriftExceeded { .. })
        ));

        assert_eq!(ctx.alignment(), before);
        assert_eq!(ctx.stats().rejected(), 2);
    }

    #[test]
    fn test_config_file_drives_context() {
        let content = r#"
[synchronization]
minimum_delta_distance = 1.0
ar_trust_range = 20.0
synchronization_bias = 0.5
"#;
        let blueprint = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let mut ctx = context(blueprint.synchronization);

        ctx.add_synchronization_node(Vector3::new(4.0, 0.0, 2.0), Vector3::zero());
        let outcome = ctx.add_synchronization_node(Vector3::new(8.0, 0.0, 2.0), Vector3::zero());
        assert_eq!(
            outcome.alignment().unwrap().position,
            Vector3::new(6.0, 0.0, 2.0)
        );
    }

    #[test]
    fn test_invalid_config_never_builds_context() {
        let config = SynchronizationConfig {
            ar_trust_range: -1.0,
            ..Default::default()
        };
        assert!(SynchronizationContext::new(config).is_err());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::Cursor;

    use contracts::{Alignment, SinkConfig, SinkType, SynchronizationConfig};
    use dispatcher::create_dispatcher;
    use ingestion::{SessionOutcome, SynchronizationSession, TraceEvent, TraceReader};
    use observability::AlignmentMetricsAggregator;
    use tokio::sync::mpsc;

    /// Recorded walk: fix before map load, a plane, a too-small step, a stale
    /// fix, then two ~11 m steps east with matching AR motion.
    const WALK: &str = r#"
{"event":"location","timestamp":0.0,"latitude":0.0,"longitude":0.0,"accuracy":3.0,"ar_position":{"x":0.0,"y":0.0,"z":0.0}}
{"event":"map_initialized","timestamp":0.5,"center":{"latitude":0.0,"longitude":0.0},"ar_position":{"x":0.2,"y":0.0,"z":0.0}}
{"event":"plane","timestamp":0.8,"height":-1.3}
{"event":"location","timestamp":1.0,"latitude":0.0,"longitude":0.000005,"ar_position":{"x":0.7,"y":0.0,"z":0.0}}
{"event":"location","timestamp":2.0,"latitude":0.0,"longitude":0.0001,"is_location_updated":false,"ar_position":{"x":5.0,"y":0.0,"z":0.0}}
{"event":"location","timestamp":3.0,"latitude":0.0,"longitude":0.0001,"ar_position":{"x":9.0,"y":0.0,"z":0.0}}
{"event":"location","timestamp":4.0,"latitude":0.0,"longitude":0.0002,"ar_position":{"x":18.0,"y":0.0,"z":0.0}}
"#;

    /// End-to-end: trace -> session -> dispatcher -> file sink
    #[tokio::test]
    async fn test_e2e_trace_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("alignments.jsonl");

        let (tx, rx) = mpsc::channel::<Alignment>(16);
        let sink_configs = vec![
            SinkConfig {
                name: "log".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 16,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "file".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 16,
                params: HashMap::from([("path".to_string(), output.display().to_string())]),
            },
        ];
        let dispatcher_handle = create_dispatcher(sink_configs, rx).await.unwrap().spawn();

        let mut session = SynchronizationSession::new(SynchronizationConfig::default()).unwrap();
        session.subscribe(move |alignment| {
            tx.try_send(*alignment).unwrap();
        });

        let mut aggregator = AlignmentMetricsAggregator::new();
        let mut outcomes = Vec::new();

        for event in TraceReader::from_reader(Cursor::new(WALK)) {
            let event = event.unwrap();
            let outcome = match &event {
                TraceEvent::MapInitialized { ar_position, .. } => {
                    let anchor = event.anchor(None).unwrap().unwrap();
                    session.on_map_initialized(anchor, *ar_position)
                }
                TraceEvent::Location { ar_position, .. } => {
                    let location = event.location().unwrap();
                    Some(session.on_location_updated(&location, *ar_position))
                }
                TraceEvent::Plane { height, .. } => {
                    session.on_plane_detected(*height);
                    None
                }
            };
            if let Some(outcome) = outcome {
                if let SessionOutcome::Node(node) = &outcome {
                    aggregator.update(node);
                }
                outcomes.push(outcome);
            }
        }

        let final_alignment = session.alignment().unwrap();
        drop(session);
        let sink_metrics = dispatcher_handle.await.unwrap();

        assert_eq!(outcomes[0], SessionOutcome::Deferred);
        assert!(outcomes[1].is_accepted(), "pending fix replayed on map init");
        assert!(!outcomes[2].is_accepted(), "half-metre step rejected");
        assert_eq!(outcomes[3], SessionOutcome::Ignored);
        assert!(outcomes[4].is_accepted());
        assert!(outcomes[5].is_accepted());

        let summary = aggregator.summary();
        assert_eq!(summary.accepted, 3);
        assert_eq!(summary.rejections.get("insufficient_movement"), Some(&1));

        let written: Vec<Alignment> = std::fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(written.len(), 3);
        assert_eq!(written[0].position.y, 0.0);
        assert!(written[1..].iter().all(|a| a.position.y == -1.3));
        assert_eq!(
            written.iter().map(|a| a.sequence).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(written[2], final_alignment);

        for (_, snapshot) in sink_metrics {
            assert_eq!(snapshot.write_count, 3);
            assert_eq!(snapshot.failure_count, 0);
        }
    }
}
