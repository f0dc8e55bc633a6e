//! Adapter for capture backends that block on a driver call. Real camera
//! SDKs deliver frames from a thread that cannot await, so the producer runs
//! on a dedicated OS thread and hands frames to the async side over a small
//! bounded channel (double buffer: the device paces itself against the
//! consumer without unbounded queueing).

use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use serde_json::Value;

use crate::frame::Frame;

use super::FrameSource;

/// Blocking frame producer run on the capture thread. Returning `Ok(None)`
/// or any error ends the stream.
pub trait BlockingFrameProducer: Send + 'static {
    fn produce(&mut self) -> Result<Option<Frame>>;
    /// Negotiated resolution, known once the producer is constructed.
    fn resolution(&self) -> (u32, u32);
}

pub struct ThreadedCamera<P: BlockingFrameProducer> {
    producer: Option<P>,
    resolution: (u32, u32),
    read_timeout: Duration,
    rx: Option<Receiver<Frame>>,
    thread: Option<JoinHandle<()>>,
}

impl<P: BlockingFrameProducer> ThreadedCamera<P> {
    pub fn new(producer: P) -> Self {
        Self {
            producer: Some(producer),
            resolution: (0, 0),
            read_timeout: Duration::from_secs(2),
            rx: None,
            thread: None,
        }
    }

    /// Upper bound on the per-frame wait; a stalled device surfaces as a
    /// read error instead of hanging the capture loop.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

#[async_trait]
impl<P: BlockingFrameProducer> FrameSource for ThreadedCamera<P> {
    async fn configure(&mut self, config: Value) -> Result<()> {
        if self.thread.is_some() {
            return Err(anyhow!("cannot configure an opened camera"));
        }
        if let Some(ms) = config["read_timeout_ms"].as_u64() {
            self.read_timeout = Duration::from_millis(ms);
        }
        Ok(())
    }

    async fn open(&mut self) -> Result<()> {
        let mut producer = self
            .producer
            .take()
            .ok_or_else(|| anyhow!("camera already opened"))?;
        self.resolution = producer.resolution();

        let (tx, rx) = bounded::<Frame>(2);
        let handle = std::thread::spawn(move || loop {
            match producer.produce() {
                Ok(Some(frame)) => {
                    // Blocks when both buffers are full; the consumer going
                    // away disconnects the channel and ends the thread.
                    if tx.send(frame).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "capture thread stopping");
                    break;
                }
            }
        });

        self.rx = Some(rx);
        self.thread = Some(handle);
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        let rx = self
            .rx
            .as_ref()
            .ok_or_else(|| anyhow!("camera not opened"))?
            .clone();
        let timeout = self.read_timeout;
        let received =
            tokio::task::spawn_blocking(move || rx.recv_timeout(timeout)).await?;
        match received {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Disconnected) => Ok(None),
            Err(RecvTimeoutError::Timeout) => {
                Err(anyhow!("no frame within {:?}", timeout))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the receiver disconnects the channel; the capture thread
        // observes it on its next send and exits.
        self.rx = None;
        if let Some(handle) = self.thread.take() {
            let joined = tokio::task::spawn_blocking(move || handle.join()).await?;
            if joined.is_err() {
                return Err(anyhow!("capture thread panicked"));
            }
        }
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }
}
