//! Optional push fan-out: the same payload JSON that goes to the delivery
//! queue can be observed by any number of subscribers. A slow or dropped
//! subscriber never affects the pipeline or the other subscribers.

use tokio::sync::broadcast;

#[derive(Clone)]
pub struct ScanBroadcaster {
    tx: broadcast::Sender<String>,
}

impl ScanBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Send to whoever is listening. No subscribers is not an error.
    pub fn publish(&self, payload_json: &str) {
        let _ = self.tx.send(payload_json.to_string());
    }
}
