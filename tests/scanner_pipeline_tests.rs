mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use lanescan::capture::{FrameSource, ScriptStep, SimulatedCamera};
use lanescan::config::ScannerConfig;
use lanescan::detect::{ean13, Ean13Detector};
use lanescan::resolver::{LookupOutcome, ProductRecord, ProductResolver, StaticCatalog};
use lanescan::scanner::ScannerContext;

use common::{spawn_sink, SinkMode};

const NOODLES: &str = "4006381333931";

fn camera(script: Vec<ScriptStep>) -> Box<dyn FrameSource> {
    Box::new(SimulatedCamera::new(640, 480).with_script(script))
}

fn config_for(sink_url: &str) -> ScannerConfig {
    let mut config = ScannerConfig::default();
    config.delivery.target_url = sink_url.to_string();
    config
}

fn noodles_catalog() -> StaticCatalog {
    StaticCatalog::with_records([ProductRecord::new(NOODLES)
        .with_name("Instant Noodles")
        .with_price("30,000 VND")])
}

fn shutdown_never() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    // Keep the sender alive for the duration of the test binary.
    std::mem::forget(tx);
    rx
}

#[tokio::test]
async fn end_to_end_success_not_found_and_dropped() {
    let sink = spawn_sink(SinkMode::Ok).await;
    let unknown = ean13::with_checksum("123456789012").unwrap();
    let incomplete = ean13::with_checksum("200000000000").unwrap();

    let mut catalog = noodles_catalog();
    // Found but missing the price: the event must be swallowed.
    catalog.insert(ProductRecord::new(&incomplete).with_name("Mystery Item"));

    let script = vec![
        ScriptStep::Barcode(NOODLES.to_string()),
        ScriptStep::Barcode(NOODLES.to_string()), // held in view, no event
        ScriptStep::Blank,
        ScriptStep::Barcode(unknown.clone()),
        ScriptStep::Blank,
        ScriptStep::Barcode(incomplete.clone()),
    ];

    let config = config_for(&sink.url);
    let context = ScannerContext::build(
        &config,
        camera(script),
        Box::new(Ean13Detector::default()),
        Box::new(catalog),
        shutdown_never(),
    )
    .unwrap();

    let report = context.run().await.unwrap();

    assert_eq!(report.metrics.frames_read, 6);
    assert_eq!(report.metrics.scan_events, 3);
    assert_eq!(report.metrics.payloads_built, 2);
    assert_eq!(report.metrics.payloads_dropped, 1);
    assert_eq!(report.delivery.delivered, 2);
    assert_eq!(report.delivery.failed, 0);

    let bodies = sink.bodies();
    assert_eq!(bodies.len(), 2);
    let first: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(first["status"], "success");
    assert_eq!(first["scanned_barcode"], NOODLES);
    assert_eq!(first["price"], 30_000.0);
    let second: serde_json::Value = serde_json::from_str(&bodies[1]).unwrap();
    assert_eq!(second["status"], "not_found");
    assert_eq!(second["scanned_barcode"], unknown);
}

#[tokio::test]
async fn gap_retriggers_delivery() {
    let sink = spawn_sink(SinkMode::Ok).await;
    let script = vec![
        ScriptStep::Barcode(NOODLES.to_string()),
        ScriptStep::Barcode(NOODLES.to_string()),
        ScriptStep::Blank,
        ScriptStep::Barcode(NOODLES.to_string()),
    ];

    let config = config_for(&sink.url);
    let context = ScannerContext::build(
        &config,
        camera(script),
        Box::new(Ean13Detector::default()),
        Box::new(noodles_catalog()),
        shutdown_never(),
    )
    .unwrap();

    let report = context.run().await.unwrap();
    assert_eq!(report.metrics.scan_events, 2);
    assert_eq!(report.delivery.delivered, 2);
}

#[tokio::test]
async fn unavailable_store_degrades_without_stopping_capture() {
    let sink = spawn_sink(SinkMode::Ok).await;
    let script = vec![
        ScriptStep::Barcode(NOODLES.to_string()),
        ScriptStep::Blank,
        ScriptStep::Barcode(NOODLES.to_string()),
    ];

    let config = config_for(&sink.url);
    let context = ScannerContext::build(
        &config,
        camera(script),
        Box::new(Ean13Detector::default()),
        Box::new(StaticCatalog::unavailable()),
        shutdown_never(),
    )
    .unwrap();

    let report = context.run().await.unwrap();

    // Every frame was still captured and both scans produced a payload.
    assert_eq!(report.metrics.frames_read, 3);
    assert_eq!(report.delivery.delivered, 2);
    for body in sink.bodies() {
        let wire: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(wire["status"], "lookup_unavailable");
    }
}

#[tokio::test]
async fn broadcast_subscribers_see_payloads_and_failures_are_isolated() {
    let sink = spawn_sink(SinkMode::Ok).await;
    let script = vec![ScriptStep::Barcode(NOODLES.to_string())];

    let config = config_for(&sink.url);
    let context = ScannerContext::build(
        &config,
        camera(script),
        Box::new(Ean13Detector::default()),
        Box::new(noodles_catalog()),
        shutdown_never(),
    )
    .unwrap();

    let mut live = context.subscribe_scans();
    let dead = context.subscribe_scans();
    drop(dead); // a vanished subscriber must not affect anyone

    let report = context.run().await.unwrap();
    assert_eq!(report.delivery.delivered, 1);

    let observed = live.recv().await.unwrap();
    let wire: serde_json::Value = serde_json::from_str(&observed).unwrap();
    assert_eq!(wire["status"], "success");
}

#[tokio::test]
async fn shutdown_signal_stops_a_looping_camera() {
    let sink = spawn_sink(SinkMode::Ok).await;
    let script = vec![
        ScriptStep::Barcode(NOODLES.to_string()),
        ScriptStep::Blank,
    ];
    let source = Box::new(
        SimulatedCamera::new(640, 480)
            .with_script(script)
            .looping(true)
            .frame_delay(Duration::from_millis(5)),
    );

    let config = config_for(&sink.url);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let context = ScannerContext::build(
        &config,
        source,
        Box::new(Ean13Detector::default()),
        Box::new(noodles_catalog()),
        shutdown_rx,
    )
    .unwrap();

    let run = tokio::spawn(context.run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(true).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not observe shutdown")
        .unwrap()
        .unwrap();
    assert!(report.metrics.frames_read > 0);
}

struct ClosableCatalog {
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl ProductResolver for ClosableCatalog {
    async fn lookup(&self, _barcode: &str) -> LookupOutcome {
        LookupOutcome::NotFound
    }

    async fn ping(&self) -> bool {
        true
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn failed_camera_open_still_releases_the_store() {
    let sink = spawn_sink(SinkMode::Ok).await;
    let closed = Arc::new(AtomicBool::new(false));

    let config = config_for(&sink.url);
    let context = ScannerContext::build(
        &config,
        Box::new(SimulatedCamera::new(0, 0)), // refuses to open
        Box::new(Ean13Detector::default()),
        Box::new(ClosableCatalog {
            closed: closed.clone(),
        }),
        shutdown_never(),
    )
    .unwrap();

    assert!(context.run().await.is_err());
    assert!(closed.load(Ordering::SeqCst));
}
