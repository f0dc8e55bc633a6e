//! Hand-off buffer between the capture loop (producer) and the delivery
//! worker (consumer). The producer side never suspends: a full queue drops
//! the newest entry with a warning instead of blocking frame capture.

use std::time::Instant;

use tokio::sync::mpsc;

/// One queued delivery, or the termination sentinel.
#[derive(Debug)]
pub enum QueueEntry {
    Deliver {
        /// Pre-serialized JSON body; ownership moves into the queue.
        body: String,
        /// Enqueue timestamp, for dwell-time diagnostics.
        enqueued_at: Instant,
    },
    /// No more work; the worker exits when it dequeues this.
    Shutdown,
}

/// Producer handle for the delivery queue.
#[derive(Clone)]
pub struct DeliveryQueue {
    tx: mpsc::Sender<QueueEntry>,
}

impl DeliveryQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<QueueEntry>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Non-blocking enqueue. Returns `false` when the entry was dropped
    /// (queue full or worker gone).
    pub fn enqueue(&self, body: String) -> bool {
        let entry = QueueEntry::Deliver {
            body,
            enqueued_at: Instant::now(),
        };
        match self.tx.try_send(entry) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("delivery queue full, dropping newest payload");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("delivery queue closed, dropping payload");
                false
            }
        }
    }

    /// Push the termination sentinel. Awaited rather than `try_send`: the
    /// producer has stopped producing by the time this runs, so waiting for
    /// one slot is harmless and the sentinel cannot be lost to saturation.
    pub async fn shutdown(&self) {
        if self.tx.send(QueueEntry::Shutdown).await.is_err() {
            tracing::debug!("delivery worker already gone at shutdown");
        }
    }
}
