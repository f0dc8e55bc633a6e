//! Per-stage pipeline counters. Shared as an `Arc` between the capture loop
//! and the delivery worker; everything is a relaxed atomic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct StageMetrics {
    frames_read: AtomicU64,
    detections: AtomicU64,
    scan_events: AtomicU64,
    payloads_built: AtomicU64,
    payloads_dropped: AtomicU64,
    enqueued: AtomicU64,
    queue_drops: AtomicU64,
    delivered: AtomicU64,
    delivery_failures: AtomicU64,
    detect_latency_us: AtomicU64,
    detect_samples: AtomicU64,
}

impl StageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self) {
        self.frames_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection(&self, latency: Duration) {
        self.detections.fetch_add(1, Ordering::Relaxed);
        self.record_detect_latency(latency);
    }

    pub fn record_detect_latency(&self, latency: Duration) {
        self.detect_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.detect_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan_event(&self) {
        self.scan_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payload_built(&self) {
        self.payloads_built.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payload_dropped(&self) {
        self.payloads_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue_drop(&self) {
        self.queue_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_detect_latency_us(&self) -> u64 {
        let samples = self.detect_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.detect_latency_us.load(Ordering::Relaxed) / samples
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_read: self.frames_read.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            scan_events: self.scan_events.load(Ordering::Relaxed),
            payloads_built: self.payloads_built.load(Ordering::Relaxed),
            payloads_dropped: self.payloads_dropped.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            queue_drops: self.queue_drops.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            avg_detect_latency_us: self.avg_detect_latency_us(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_read: u64,
    pub detections: u64,
    pub scan_events: u64,
    pub payloads_built: u64,
    pub payloads_dropped: u64,
    pub enqueued: u64,
    pub queue_drops: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
    pub avg_detect_latency_us: u64,
}
