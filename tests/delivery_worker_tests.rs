mod common;

use std::sync::Arc;
use std::time::Duration;

use lanescan::metrics::StageMetrics;
use lanescan::pipeline::{DeliveryQueue, DeliveryWorker};

use common::{spawn_sink, SinkMode};

#[tokio::test]
async fn delivers_in_order_and_counts() {
    let sink = spawn_sink(SinkMode::Ok).await;
    let metrics = Arc::new(StageMetrics::new());

    let (queue, rx) = DeliveryQueue::new(8);
    let worker = DeliveryWorker::new(&sink.url, Duration::from_secs(5)).unwrap();
    let handle = worker.spawn(rx, metrics.clone());

    for body in [r#"{"n":1}"#, r#"{"n":2}"#, r#"{"n":3}"#] {
        assert!(queue.enqueue(body.to_string()));
    }
    queue.shutdown().await;

    let stats = handle.await.unwrap();
    assert_eq!(stats.delivered, 3);
    assert_eq!(stats.failed, 0);
    assert_eq!(sink.bodies(), vec![r#"{"n":1}"#, r#"{"n":2}"#, r#"{"n":3}"#]);
    assert_eq!(metrics.snapshot().delivered, 3);
}

#[tokio::test]
async fn non_2xx_is_a_failure() {
    let sink = spawn_sink(SinkMode::Reject(500)).await;
    let metrics = Arc::new(StageMetrics::new());

    let (queue, rx) = DeliveryQueue::new(8);
    let handle = DeliveryWorker::new(&sink.url, Duration::from_secs(5))
        .unwrap()
        .spawn(rx, metrics.clone());

    assert!(queue.enqueue("{}".to_string()));
    queue.shutdown().await;

    let stats = handle.await.unwrap();
    assert_eq!(stats.delivered, 0);
    assert_eq!(stats.failed, 1);
    assert_eq!(metrics.snapshot().delivery_failures, 1);
}

#[tokio::test]
async fn timed_out_delivery_gets_exactly_one_attempt() {
    let sink = spawn_sink(SinkMode::Stall).await;
    let metrics = Arc::new(StageMetrics::new());

    let (queue, rx) = DeliveryQueue::new(8);
    let handle = DeliveryWorker::new(&sink.url, Duration::from_millis(200))
        .unwrap()
        .spawn(rx, metrics.clone());

    assert!(queue.enqueue("{}".to_string()));
    queue.shutdown().await;

    let stats = handle.await.unwrap();
    assert_eq!(stats.failed, 1);

    // Observation window: no retry may show up after the worker exits.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(sink.request_count(), 1);
}

#[tokio::test]
async fn connection_failure_is_isolated() {
    // Nothing listens on this port; the attempt must fail without panicking
    // and the worker must keep draining.
    let metrics = Arc::new(StageMetrics::new());
    let (queue, rx) = DeliveryQueue::new(8);
    let handle = DeliveryWorker::new("http://127.0.0.1:9/cart", Duration::from_secs(1))
        .unwrap()
        .spawn(rx, metrics);

    assert!(queue.enqueue("{}".to_string()));
    assert!(queue.enqueue("{}".to_string()));
    queue.shutdown().await;

    let stats = handle.await.unwrap();
    assert_eq!(stats.failed, 2);
}
