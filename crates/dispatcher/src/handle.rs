//! SinkHandle - one sink behind its own bounded queue and worker task
//!
//! Alignments are latest-wins state: when the queue is full the handle keeps
//! the newest overflowing alignment aside and the worker writes it once the
//! queue drains. Older overflow is dropped, and anything not newer than the
//! last written sequence is skipped.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace};

use contracts::{Alignment, AlignmentSink};

use crate::error::DispatcherError;
use crate::metrics::{Delivery, SinkMetrics};

/// Newest alignment that did not fit in the queue
type HeldSlot = Arc<Mutex<Option<Alignment>>>;

/// How [`SinkHandle::try_send`] admitted an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Placed in the queue
    Queued,
    /// Queue full; held until the queue drains. `dropped` names the
    /// sequence that lost its place to a newer one, if any
    Held { dropped: Option<u64> },
}

pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<Alignment>,
    held: HeldSlot,
    metrics: Arc<SinkMetrics>,
    worker: JoinHandle<()>,
}

impl SinkHandle {
    /// Start the worker for `sink`
    pub fn spawn<S: AlignmentSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let held = HeldSlot::default();
        let metrics = Arc::new(SinkMetrics::new());

        let worker = tokio::spawn(sink_worker(
            sink,
            rx,
            Arc::clone(&held),
            Arc::clone(&metrics),
        ));

        Self {
            name,
            tx,
            held,
            metrics,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Hand an alignment to the sink without waiting
    pub fn try_send(&self, alignment: Alignment) -> Result<Admission, DispatcherError> {
        match self.tx.try_send(alignment) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                Ok(Admission::Queued)
            }
            Err(mpsc::error::TrySendError::Full(overflow)) => {
                let dropped = hold_newest(&self.held, overflow);
                if let Some(sequence) = dropped {
                    self.metrics.record(Delivery::Dropped(sequence));
                }
                trace!(
                    sink = %self.name,
                    sequence = overflow.sequence,
                    ?dropped,
                    "queue full, alignment held"
                );
                Ok(Admission::Held { dropped })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                Err(DispatcherError::SinkClosed {
                    sink_name: self.name.clone(),
                })
            }
        }
    }

    /// Close the queue and wait until the worker flushed and closed the sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
    }
}

/// Keep whichever of the held and the overflowing alignment is newer;
/// returns the sequence that lost
fn hold_newest(held: &HeldSlot, overflow: Alignment) -> Option<u64> {
    let mut slot = held.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match *slot {
        Some(current) if current.sequence > overflow.sequence => Some(overflow.sequence),
        Some(current) => {
            *slot = Some(overflow);
            Some(current.sequence)
        }
        None => {
            *slot = Some(overflow);
            None
        }
    }
}

fn take_held(held: &HeldSlot) -> Option<Alignment> {
    held.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
}

#[instrument(name = "sink_worker_loop", skip_all, fields(sink = %sink.name()))]
async fn sink_worker<S: AlignmentSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Alignment>,
    held: HeldSlot,
    metrics: Arc<SinkMetrics>,
) {
    debug!("Sink worker started");

    while let Some(alignment) = rx.recv().await {
        metrics.set_queue_len(rx.len());
        deliver(&mut sink, alignment, &metrics).await;

        if rx.is_empty() {
            if let Some(alignment) = take_held(&held) {
                deliver(&mut sink, alignment, &metrics).await;
            }
        }
    }

    if let Some(alignment) = take_held(&held) {
        deliver(&mut sink, alignment, &metrics).await;
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "Close failed on shutdown");
    }

    debug!(last_sequence = ?metrics.last_written(), "Sink worker stopped");
}

async fn deliver<S: AlignmentSink>(sink: &mut S, alignment: Alignment, metrics: &SinkMetrics) {
    let sequence = alignment.sequence;
    if metrics.last_written().is_some_and(|last| sequence <= last) {
        metrics.record(Delivery::Superseded(sequence));
        return;
    }

    match sink.write(&alignment).await {
        Ok(()) => metrics.record(Delivery::Written(sequence)),
        Err(e) => {
            // the worker keeps going; the next alignment may succeed
            metrics.record(Delivery::Failed(sequence));
            error!(sequence, error = %e, "Write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, Vector3};
    use tokio::time::{sleep, Duration};

    /// Records written sequences; optionally slow or failing
    struct RecordingSink {
        written: Arc<Mutex<Vec<u64>>>,
        fail: bool,
        delay: Duration,
    }

    impl RecordingSink {
        fn new(delay_ms: u64, fail: bool) -> (Self, Arc<Mutex<Vec<u64>>>) {
            let written = Arc::new(Mutex::new(Vec::new()));
            let sink = Self {
                written: Arc::clone(&written),
                fail,
                delay: Duration::from_millis(delay_ms),
            };
            (sink, written)
        }
    }

    impl AlignmentSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn write(&mut self, alignment: &Alignment) -> Result<(), ContractError> {
            sleep(self.delay).await;
            if self.fail {
                let sequence = alignment.sequence;
                return Err(ContractError::alignment_write("recording", sequence, "refused"));
            }
            self.written.lock().unwrap().push(alignment.sequence);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn alignment(sequence: u64) -> Alignment {
        Alignment {
            sequence,
            ..Alignment::from_offset(Vector3::new(sequence as f64, 0.0, 0.0))
        }
    }

    #[tokio::test]
    async fn test_writes_in_sequence_order() {
        let (sink, written) = RecordingSink::new(0, false);
        let handle = SinkHandle::spawn(sink, 10);

        for sequence in 1..=5 {
            assert_eq!(handle.try_send(alignment(sequence)).unwrap(), Admission::Queued);
        }

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        assert_eq!(*written.lock().unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(metrics.last_written(), Some(5));
    }

    #[tokio::test]
    async fn test_overflow_keeps_newest_alignment() {
        let (sink, written) = RecordingSink::new(20, false);
        let handle = SinkHandle::spawn(sink, 1);

        let held = (1..=8)
            .map(|sequence| handle.try_send(alignment(sequence)).unwrap())
            .filter(|admission| matches!(admission, Admission::Held { .. }))
            .count();
        assert!(held > 0);

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;

        let written = written.lock().unwrap();
        assert_eq!(written.last(), Some(&8));
        assert!(written.windows(2).all(|pair| pair[0] < pair[1]));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.write_count + snapshot.dropped_count, 8);
        assert!(snapshot.is_current_with(8));
    }

    #[tokio::test]
    async fn test_stale_alignment_is_superseded() {
        let (sink, written) = RecordingSink::new(0, false);
        let handle = SinkHandle::spawn(sink, 10);

        handle.try_send(alignment(5)).unwrap();
        handle.try_send(alignment(3)).unwrap();

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;
        assert_eq!(*written.lock().unwrap(), vec![5]);
        assert_eq!(metrics.snapshot().superseded_count, 1);
    }

    #[test]
    fn test_hold_newest_keeps_higher_sequence() {
        let held = HeldSlot::default();
        assert_eq!(hold_newest(&held, alignment(4)), None);
        assert_eq!(hold_newest(&held, alignment(6)), Some(4));
        assert_eq!(hold_newest(&held, alignment(5)), Some(5));
        assert_eq!(take_held(&held).map(|a| a.sequence), Some(6));
    }

    #[tokio::test]
    async fn test_failed_writes_do_not_stop_worker() {
        let (sink, _) = RecordingSink::new(0, true);
        let handle = SinkHandle::spawn(sink, 10);

        for sequence in 1..=3 {
            handle.try_send(alignment(sequence)).unwrap();
        }
        sleep(Duration::from_millis(50)).await;

        let snapshot = handle.metrics().snapshot();
        assert_eq!(snapshot.failure_count, 3);
        assert_eq!(snapshot.last_sequence, None);
        handle.shutdown().await;
    }
}
