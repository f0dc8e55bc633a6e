//! Background delivery worker: drains the queue sequentially and POSTs each
//! payload once. Failures are logged and the event is lost; there is no
//! retry and no re-queue. Loss of a single POST is preferable to a retry
//! storm against a sink that may be down.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::metrics::StageMetrics;

use super::queue::QueueEntry;

/// Classified result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx response.
    Delivered(u16),
    /// Any non-2xx status.
    Rejected(u16),
    TimedOut,
    ConnectionFailed,
    Failed(String),
}

/// Totals reported by the worker when it exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

pub struct DeliveryWorker {
    client: reqwest::Client,
    target_url: String,
}

impl DeliveryWorker {
    pub fn new(target_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            target_url: target_url.into(),
        })
    }

    /// Spawn the consumer loop. Exactly one worker consumes the queue;
    /// delivery order matches enqueue order.
    pub fn spawn(
        self,
        rx: mpsc::Receiver<QueueEntry>,
        metrics: Arc<StageMetrics>,
    ) -> JoinHandle<DeliveryStats> {
        tokio::spawn(self.run(rx, metrics))
    }

    async fn run(
        self,
        mut rx: mpsc::Receiver<QueueEntry>,
        metrics: Arc<StageMetrics>,
    ) -> DeliveryStats {
        tracing::info!(target = %self.target_url, "delivery worker started");
        let mut stats = DeliveryStats::default();
        loop {
            match rx.recv().await {
                None | Some(QueueEntry::Shutdown) => {
                    tracing::info!("delivery worker received stop signal, exiting");
                    break;
                }
                Some(QueueEntry::Deliver { body, enqueued_at }) => {
                    tracing::debug!(
                        dwell_ms = enqueued_at.elapsed().as_millis() as u64,
                        "dequeued payload"
                    );
                    match self.post_once(&body).await {
                        DeliveryOutcome::Delivered(status) => {
                            tracing::info!(status, "payload delivered");
                            metrics.record_delivered();
                            stats.delivered += 1;
                        }
                        outcome => {
                            match &outcome {
                                DeliveryOutcome::Rejected(status) => {
                                    tracing::error!(status, "delivery rejected")
                                }
                                DeliveryOutcome::TimedOut => {
                                    tracing::error!(target = %self.target_url, "delivery timed out")
                                }
                                DeliveryOutcome::ConnectionFailed => {
                                    tracing::error!(target = %self.target_url, "connection failed")
                                }
                                DeliveryOutcome::Failed(reason) => {
                                    tracing::error!(%reason, "delivery failed")
                                }
                                DeliveryOutcome::Delivered(_) => unreachable!(),
                            }
                            metrics.record_delivery_failure();
                            stats.failed += 1;
                        }
                    }
                }
            }
        }
        stats
    }

    /// Single delivery attempt with the client's bounded timeout.
    async fn post_once(&self, body: &str) -> DeliveryOutcome {
        let result = self
            .client
            .post(&self.target_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await;
        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                if response.status().is_success() {
                    DeliveryOutcome::Delivered(status)
                } else {
                    DeliveryOutcome::Rejected(status)
                }
            }
            Err(e) if e.is_timeout() => DeliveryOutcome::TimedOut,
            Err(e) if e.is_connect() => DeliveryOutcome::ConnectionFailed,
            Err(e) => DeliveryOutcome::Failed(e.to_string()),
        }
    }
}
