//! Process-level orchestration. A `ScannerContext` is built once at startup,
//! owns every long-lived resource, and is torn down once at shutdown —
//! camera first, then the store connection, then the delivery worker via the
//! queue sentinel.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::broadcast::ScanBroadcaster;
use crate::capture::{FrameSource, ManagedCamera};
use crate::config::ScannerConfig;
use crate::detect::SymbolDetector;
use crate::frame::Frame;
use crate::metrics::{MetricsSnapshot, StageMetrics};
use crate::pipeline::{build_payload, DeduplicationGate, DeliveryQueue, DeliveryStats, DeliveryWorker};
use crate::render::{FpsCounter, Renderer};
use crate::resolver::ProductResolver;

/// Final accounting returned by a completed run.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub metrics: MetricsSnapshot,
    pub delivery: DeliveryStats,
}

pub struct ScannerContext {
    camera: ManagedCamera,
    detector: Box<dyn SymbolDetector>,
    resolver: Box<dyn ProductResolver>,
    gate: DeduplicationGate,
    queue: DeliveryQueue,
    worker: Option<JoinHandle<DeliveryStats>>,
    broadcaster: ScanBroadcaster,
    renderer: Renderer,
    fps: FpsCounter,
    metrics: Arc<StageMetrics>,
    shutdown_rx: watch::Receiver<bool>,
    frame_sink: Option<mpsc::Sender<Frame>>,
}

impl ScannerContext {
    /// Wire the pipeline together and spawn the delivery worker. The camera
    /// is not opened yet; `run` does that so that open failures go through
    /// the same teardown path.
    pub fn build(
        config: &ScannerConfig,
        source: Box<dyn FrameSource>,
        detector: Box<dyn SymbolDetector>,
        resolver: Box<dyn ProductResolver>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let metrics = Arc::new(StageMetrics::new());
        let (queue, rx) = DeliveryQueue::new(config.delivery.queue_capacity);
        let worker = DeliveryWorker::new(
            &config.delivery.target_url,
            Duration::from_millis(config.delivery.timeout_ms),
        )
        .context("cannot build delivery worker")?
        .spawn(rx, metrics.clone());

        Ok(Self {
            camera: ManagedCamera::new(source),
            detector,
            resolver,
            gate: DeduplicationGate::new(),
            queue,
            worker: Some(worker),
            broadcaster: ScanBroadcaster::new(16),
            renderer: Renderer::new(config.display.box_thickness, config.display.show_fps),
            fps: FpsCounter::new(),
            metrics: metrics.clone(),
            shutdown_rx,
            frame_sink: None,
        })
    }

    /// Subscribe to the payload JSON fan-out.
    pub fn subscribe_scans(&self) -> tokio::sync::broadcast::Receiver<String> {
        self.broadcaster.subscribe()
    }

    /// Attach a sink for annotated frames. The hand-off is drop-on-full; a
    /// slow display never stalls capture.
    pub fn set_frame_sink(&mut self, sink: mpsc::Sender<Frame>) {
        self.frame_sink = Some(sink);
    }

    pub fn metrics(&self) -> Arc<StageMetrics> {
        self.metrics.clone()
    }

    /// Run the capture loop to completion (end of stream, read failure, or
    /// shutdown signal), then tear everything down in order.
    pub async fn run(mut self) -> Result<ScanReport> {
        if let Err(e) = self.camera.open().await {
            tracing::error!(error = %e, "camera unavailable");
            // Camera never opened, but partially-acquired resources still
            // get released.
            let _ = self.teardown().await;
            return Err(e.context("camera unavailable"));
        }

        if self.resolver.ping().await {
            tracing::info!("catalog is reachable");
        } else {
            tracing::warn!("catalog not reachable at startup, lookups will degrade");
        }

        loop {
            if *self.shutdown_rx.borrow() {
                tracing::info!("shutdown requested");
                break;
            }
            let frame = match self.camera.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("end of stream");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "frame read failed, stopping");
                    break;
                }
            };
            self.metrics.record_frame();
            self.process_frame(&frame).await;
        }

        Ok(self.teardown().await)
    }

    /// One frame through detect → render → dedup → resolve → build → queue.
    /// Everything past the gate is skipped for frames with no new scan.
    async fn process_frame(&mut self, frame: &Frame) {
        let detection = self.detector.detect(frame);
        if detection.is_empty() {
            self.metrics.record_detect_latency(detection.latency);
        } else {
            self.metrics.record_detection(detection.latency);
        }

        let fps = self.fps.tick();
        if let Some(sink) = &self.frame_sink {
            let annotated = self.renderer.annotate(frame, &detection.symbols, fps);
            // Display is best-effort; drop the frame if the sink is behind.
            let _ = sink.try_send(annotated);
        }

        let Some(scan) = self.gate.observe(&detection) else {
            return;
        };
        self.metrics.record_scan_event();
        tracing::info!(barcode = %scan.payload, "new barcode detected, looking up");

        let outcome = self.resolver.lookup(&scan.payload).await;
        let Some(payload) = build_payload(&scan.payload, outcome) else {
            self.metrics.record_payload_dropped();
            return;
        };
        self.metrics.record_payload_built();

        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "cannot serialize payload, dropping");
                self.metrics.record_payload_dropped();
                return;
            }
        };
        self.broadcaster.publish(&body);
        if self.queue.enqueue(body) {
            self.metrics.record_enqueued();
        } else {
            self.metrics.record_queue_drop();
        }
    }

    /// Release order: camera, store connection, worker sentinel, worker join.
    async fn teardown(mut self) -> ScanReport {
        if let Err(e) = self.camera.close().await {
            tracing::warn!(error = %e, "camera close failed");
        }
        self.resolver.close().await;
        self.queue.shutdown().await;
        let delivery = match self.worker.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => DeliveryStats::default(),
        };
        let metrics = self.metrics.snapshot();
        tracing::info!(?metrics, ?delivery, "scanner stopped");
        ScanReport { metrics, delivery }
    }
}
