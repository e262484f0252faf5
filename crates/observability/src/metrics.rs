//! Alignment metrics collection.
//!
//! Per-node counters are recorded by the synchronization context itself
//! (`ar_sync_nodes_total`, `ar_sync_nodes_rejected_total`, `ar_sync_bias`,
//! `ar_sync_alignment_correction_m`). This module covers what happens to an
//! alignment after it leaves the context, plus in-memory summaries.

use std::collections::BTreeMap;

use contracts::Alignment;
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use sync_engine::NodeOutcome;

/// Record an alignment delivered to session listeners
pub fn record_alignment_emitted(alignment: &Alignment) {
    counter!("ar_sync_alignments_emitted_total").increment(1);
    gauge!("ar_sync_alignment_sequence").set(alignment.sequence as f64);
    gauge!("ar_sync_alignment_position_m", "axis" => "x").set(alignment.position.x);
    gauge!("ar_sync_alignment_position_m", "axis" => "y").set(alignment.position.y);
    gauge!("ar_sync_alignment_position_m", "axis" => "z").set(alignment.position.z);
    gauge!("ar_sync_alignment_rotation_deg").set(alignment.rotation);
}

/// Record an alignment handed to a sink
pub fn record_alignment_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "dropped" };
    counter!(
        "ar_sync_alignments_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record how far replay runs behind the recorded timeline
pub fn record_replay_lag_ms(lag_ms: f64) {
    histogram!("ar_sync_replay_lag_ms").record(lag_ms);
}

/// Register help text for every metric the workspace records
pub fn describe() {
    describe_counter!("ar_sync_nodes_total", "Synchronization nodes evaluated, by outcome");
    describe_counter!(
        "ar_sync_nodes_rejected_total",
        "Rejected synchronization nodes, by reason"
    );
    describe_histogram!("ar_sync_bias", "Effective blend factor of accepted nodes");
    describe_histogram!(
        "ar_sync_alignment_correction_m",
        "Shift of the alignment caused by one accepted node (metres)"
    );
    describe_counter!("ar_session_locations_total", "Location updates, by session outcome");
    describe_counter!("ar_sync_alignments_emitted_total", "Alignments emitted to listeners");
    describe_gauge!("ar_sync_alignment_sequence", "Sequence of the latest alignment");
    describe_gauge!("ar_sync_alignment_position_m", "AR origin in world coordinates (metres)");
    describe_gauge!("ar_sync_alignment_rotation_deg", "Yaw of the AR frame (degrees)");
    describe_counter!(
        "ar_sync_alignments_dispatched_total",
        "Alignments handed to the dispatcher, by status"
    );
    describe_histogram!(
        "ar_sync_replay_lag_ms",
        Unit::Milliseconds,
        "How far replay runs behind the recorded timeline"
    );
}

/// In-memory aggregation of node outcomes
#[derive(Debug, Clone, Default)]
pub struct AlignmentMetricsAggregator {
    /// Nodes fed to the context
    pub total_nodes: u64,

    /// Nodes accepted
    pub accepted: u64,

    /// Rejections keyed by reason label
    pub rejections: BTreeMap<&'static str, u64>,

    /// Effective bias of accepted nodes
    pub bias_stats: RunningStats,

    /// Distance between consecutive alignments (metres)
    pub correction_stats: RunningStats,

    /// Yaw of accepted alignments (degrees)
    pub rotation_stats: RunningStats,

    last: Option<Alignment>,
}

impl AlignmentMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one node outcome into the statistics
    pub fn update(&mut self, outcome: &NodeOutcome) {
        self.total_nodes += 1;
        match outcome {
            NodeOutcome::Accepted(alignment) => {
                self.accepted += 1;
                self.bias_stats.push(alignment.bias);
                self.rotation_stats.push(alignment.rotation);
                if let Some(last) = &self.last {
                    self.correction_stats
                        .push(last.position.distance(&alignment.position));
                }
                self.last = Some(*alignment);
            }
            NodeOutcome::Rejected(reason) => {
                *self.rejections.entry(reason.label()).or_insert(0) += 1;
            }
        }
    }

    /// Last accepted alignment
    pub fn last_alignment(&self) -> Option<&Alignment> {
        self.last.as_ref()
    }

    pub fn summary(&self) -> MetricsSummary {
        let rejected = self.total_nodes - self.accepted;
        MetricsSummary {
            total_nodes: self.total_nodes,
            accepted: self.accepted,
            rejected,
            acceptance_rate: if self.total_nodes > 0 {
                self.accepted as f64 / self.total_nodes as f64 * 100.0
            } else {
                0.0
            },
            rejections: self.rejections.clone(),
            bias: StatsSummary::from(&self.bias_stats),
            correction_m: StatsSummary::from(&self.correction_stats),
            rotation_deg: StatsSummary::from(&self.rotation_stats),
            final_alignment: self.last,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_nodes: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub acceptance_rate: f64,
    pub rejections: BTreeMap<&'static str, u64>,
    pub bias: StatsSummary,
    pub correction_m: StatsSummary,
    pub rotation_deg: StatsSummary,
    pub final_alignment: Option<Alignment>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Alignment Metrics Summary ===")?;
        writeln!(f, "Nodes: {}", self.total_nodes)?;
        writeln!(
            f,
            "Accepted: {} ({:.2}%)",
            self.accepted, self.acceptance_rate
        )?;
        writeln!(f, "Rejected: {}", self.rejected)?;
        for (reason, count) in &self.rejections {
            writeln!(f, "  {}: {}", reason, count)?;
        }
        writeln!(f, "Bias: {}", self.bias)?;
        writeln!(f, "Correction (m): {}", self.correction_m)?;
        writeln!(f, "Rotation (deg): {}", self.rotation_deg)?;

        if let Some(alignment) = &self.final_alignment {
            writeln!(
                f,
                "Final alignment: position={} rotation={:.3} (sequence {})",
                alignment.position, alignment.rotation, alignment.sequence
            )?;
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
