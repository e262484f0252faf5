//! Replay statistics.

use std::time::Duration;

use contracts::Alignment;
use dispatcher::MetricsSnapshot;
use observability::AlignmentMetricsAggregator;
use serde::Serialize;
use sync_engine::SynchronizationStats;

/// Statistics from a replay run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Trace events processed
    pub events: u64,

    /// Location events seen
    pub locations: u64,

    /// Map initialisation events seen
    pub map_events: u64,

    /// Plane events seen
    pub plane_events: u64,

    /// Locations held back until the map was ready
    pub deferred: u64,

    /// Locations that were not fresh fixes
    pub ignored: u64,

    /// Alignments that did not fit in the dispatcher channel
    pub alignments_dropped: u64,

    /// Context counters at the end of the run
    pub context: SynchronizationStats,

    /// Alignment seen by session listeners at the end of the run
    pub final_alignment: Option<Alignment>,

    /// Per-sink counters after flush
    pub sink_metrics: Vec<(String, MetricsSnapshot)>,

    /// Node outcome aggregation
    pub alignment_metrics: AlignmentMetricsAggregator,

    /// Stopped by a shutdown signal
    pub interrupted: bool,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of configured sinks
    pub active_sinks: usize,
}

/// Machine-readable subset of [`PipelineStats`]
#[derive(Debug, Serialize)]
struct StatsReport<'a> {
    events: u64,
    locations: u64,
    deferred: u64,
    ignored: u64,
    context: &'a SynchronizationStats,
    final_alignment: Option<&'a Alignment>,
    alignments_dropped: u64,
    interrupted: bool,
    duration_secs: f64,
}

impl PipelineStats {
    /// Trace events per second
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Accepted share of nodes fed to the context, in percent
    pub fn acceptance_rate(&self) -> f64 {
        let total = self.context.total();
        if total > 0 {
            (self.context.accepted as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// JSON report of the run
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&StatsReport {
            events: self.events,
            locations: self.locations,
            deferred: self.deferred,
            ignored: self.ignored,
            context: &self.context,
            final_alignment: self.final_alignment.as_ref(),
            alignments_dropped: self.alignments_dropped,
            interrupted: self.interrupted,
            duration_secs: self.duration.as_secs_f64(),
        })
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Replay Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Events: {} ({:.1}/s)", self.events, self.events_per_sec());
        println!("   ├─ Map events: {}", self.map_events);
        println!("   ├─ Plane events: {}", self.plane_events);
        println!("   ├─ Locations: {}", self.locations);
        println!("   │   ├─ deferred: {}", self.deferred);
        println!("   │   └─ ignored: {}", self.ignored);
        println!("   └─ Interrupted: {}", self.interrupted);

        println!("\nSynchronization");
        println!(
            "   ├─ Accepted: {} ({:.2}%)",
            self.context.accepted,
            self.acceptance_rate()
        );
        println!("   ├─ Rejected (non-finite): {}", self.context.rejected_non_finite);
        println!("   ├─ Rejected (movement): {}", self.context.rejected_movement);
        println!("   ├─ Rejected (drift): {}", self.context.rejected_drift);
        match &self.final_alignment {
            Some(alignment) => println!(
                "   └─ Final alignment: {} yaw {:.2}° (sequence {})",
                alignment.position, alignment.rotation, alignment.sequence
            ),
            None => println!("   └─ Final alignment: none"),
        }

        let summary = self.alignment_metrics.summary();
        println!("\nAlignment Metrics");
        println!("   ├─ Bias: {}", summary.bias);
        println!("   ├─ Correction (m): {}", summary.correction_m);
        println!("   └─ Rotation (deg): {}", summary.rotation_deg);

        println!("\nSinks ({})", self.active_sinks);
        if self.alignments_dropped > 0 {
            println!("   ├─ Dropped before dispatch: {}", self.alignments_dropped);
        }
        for (i, (name, snapshot)) in self.sink_metrics.iter().enumerate() {
            let prefix = if i == self.sink_metrics.len() - 1 {
                "└─"
            } else {
                "├─"
            };
            let latest = self.final_alignment.map(|alignment| alignment.sequence);
            let current = match (snapshot.last_sequence, latest) {
                (Some(last), Some(latest)) if snapshot.is_current_with(latest) => {
                    format!("up to date at #{last}")
                }
                (Some(last), _) => format!("last #{last}"),
                (None, _) => "nothing written".to_string(),
            };
            println!(
                "   {} {}: written={} failed={} dropped={} superseded={} ({})",
                prefix,
                name,
                snapshot.write_count,
                snapshot.failure_count,
                snapshot.dropped_count,
                snapshot.superseded_count,
                current
            );
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_rate() {
        let stats = PipelineStats {
            context: SynchronizationStats {
                accepted: 3,
                rejected_non_finite: 0,
                rejected_movement: 1,
                rejected_drift: 0,
            },
            ..Default::default()
        };
        assert!((stats.acceptance_rate() - 75.0).abs() < 1e-10);
        assert_eq!(PipelineStats::default().acceptance_rate(), 0.0);
    }

    #[test]
    fn test_json_report() {
        let stats = PipelineStats {
            events: 4,
            interrupted: true,
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
        assert_eq!(json["events"], 4);
        assert_eq!(json["interrupted"], true);
        assert!(json["final_alignment"].is_null());
    }
}
