//! Per-sink delivery accounting.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// What happened to one alignment at a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Persisted by the sink
    Written(u64),
    /// The sink returned an error
    Failed(u64),
    /// Lost to queue overflow before reaching the sink
    Dropped(u64),
    /// Skipped because a newer alignment was already written
    Superseded(u64),
}

#[derive(Debug, Default)]
pub struct SinkMetrics {
    queue_len: AtomicUsize,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    superseded: AtomicU64,
    /// Highest written sequence; 0 until the first write
    last_written: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, delivery: Delivery) {
        match delivery {
            Delivery::Written(sequence) => {
                self.written.fetch_add(1, Ordering::Relaxed);
                self.last_written.fetch_max(sequence, Ordering::Relaxed);
            }
            Delivery::Failed(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
            Delivery::Dropped(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Delivery::Superseded(_) => {
                self.superseded.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Sequence of the newest alignment the sink has persisted
    pub fn last_written(&self) -> Option<u64> {
        (self.written.load(Ordering::Relaxed) > 0)
            .then(|| self.last_written.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len.load(Ordering::Relaxed),
            write_count: self.written.load(Ordering::Relaxed),
            failure_count: self.failed.load(Ordering::Relaxed),
            dropped_count: self.dropped.load(Ordering::Relaxed),
            superseded_count: self.superseded.load(Ordering::Relaxed),
            last_sequence: self.last_written(),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub superseded_count: u64,
    pub last_sequence: Option<u64>,
}

impl MetricsSnapshot {
    /// True when the sink persisted `sequence` or something newer
    pub fn is_current_with(&self, sequence: u64) -> bool {
        self.last_sequence.is_some_and(|last| last >= sequence)
    }
}
