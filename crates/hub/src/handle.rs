//! SinkHandle - runs a sink on its own queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{ActivityChanged, ActivityListener, ActivitySink, ContractError};

use crate::sink_metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<ActivityChanged>,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task. Must be called inside a tokio runtime.
    pub fn spawn<S: ActivitySink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue an event without blocking.
    ///
    /// Returns false when the queue is full (event dropped) or closed.
    pub fn try_send(&self, event: ActivityChanged) -> bool {
        enqueue(&self.tx, &self.metrics, &self.name, event)
    }

    /// A listener that forwards into this handle's queue.
    ///
    /// It holds only a weak sender, so [`shutdown`](Self::shutdown) still
    /// closes the queue while the listener is subscribed somewhere.
    pub fn listener(&self) -> SinkListener {
        SinkListener {
            name: self.name.clone(),
            tx: self.tx.downgrade(),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Close the queue, drain it, then flush and close the sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

/// Hub-facing adapter of a [`SinkHandle`]
pub struct SinkListener {
    name: String,
    tx: mpsc::WeakSender<ActivityChanged>,
    metrics: Arc<SinkMetrics>,
}

impl ActivityListener for SinkListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_activity_changed(&self, event: &ActivityChanged) -> Result<(), ContractError> {
        let Some(tx) = self.tx.upgrade() else {
            self.metrics.inc_dropped_count();
            return Err(ContractError::sink_write(&self.name, "sink already shut down"));
        };

        if enqueue(&tx, &self.metrics, &self.name, *event) {
            Ok(())
        } else {
            Err(ContractError::sink_write(&self.name, "event not queued"))
        }
    }
}

fn enqueue(
    tx: &mpsc::Sender<ActivityChanged>,
    metrics: &SinkMetrics,
    name: &str,
    event: ActivityChanged,
) -> bool {
    match tx.try_send(event) {
        Ok(()) => {
            metrics.set_queue_len(tx.max_capacity() - tx.capacity());
            true
        }
        Err(mpsc::error::TrySendError::Full(e)) => {
            metrics.inc_dropped_count();
            warn!(
                sink = %name,
                label = %e.label,
                timestamp_ms = e.timestamp_ms,
                "Queue full, event dropped"
            );
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            metrics.inc_dropped_count();
            error!(sink = %name, "Sink worker closed unexpectedly");
            false
        }
    }
}

/// Worker task that consumes events and writes to the sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: ActivitySink>(
    mut sink: S,
    mut rx: mpsc::Receiver<ActivityChanged>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(event) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&event).await {
            Ok(()) => {
                metrics.inc_write_count();
            }
            Err(e) => {
                metrics.inc_failure_count();
                error!(
                    sink = %name,
                    label = %event.label,
                    error = %e,
                    "Write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}
