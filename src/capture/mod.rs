pub mod simulated;
pub mod still;
pub mod threaded;

pub use simulated::{ScriptStep, SimulatedCamera};
pub use still::StillSource;
pub use threaded::{BlockingFrameProducer, ThreadedCamera};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::frame::Frame;

/// Lifecycle state of a frame source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceState {
    Unopened,
    Opened,
    Running,
    Stopped,
    Closed,
    Error(String),
}

/// Sequential frame acquisition seam. Resolution requests are best-effort;
/// `resolution` reports what the device actually negotiated. Device
/// disconnect surfaces as `Ok(None)` (end of stream), not an error.
#[async_trait]
pub trait FrameSource: Send {
    /// Apply source-specific settings. Valid only before `open`.
    async fn configure(&mut self, config: Value) -> Result<()>;

    async fn open(&mut self) -> Result<()>;

    /// Next frame, `Ok(None)` at end of stream. The wait is bounded by the
    /// device frame rate.
    async fn read_frame(&mut self) -> Result<Option<Frame>>;

    async fn close(&mut self) -> Result<()>;

    /// Negotiated resolution; `(0, 0)` until the source has opened.
    fn resolution(&self) -> (u32, u32);
}

/// Wraps a frame source with explicit lifecycle state checks. Close is
/// idempotent and safe to call on a source that has already failed.
pub struct ManagedCamera {
    inner: Box<dyn FrameSource>,
    state: SourceState,
}

impl ManagedCamera {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            inner: source,
            state: SourceState::Unopened,
        }
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.inner.resolution()
    }

    pub async fn configure(&mut self, config: Value) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("cannot configure camera in state {:?}", self.state));
        }
        self.inner.configure(config).await
    }

    pub async fn open(&mut self) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("cannot open camera in state {:?}", self.state));
        }
        match self.inner.open().await {
            Ok(()) => {
                self.state = SourceState::Opened;
                let (w, h) = self.inner.resolution();
                tracing::info!(width = w, height = h, "camera opened");
                Ok(())
            }
            Err(e) => {
                self.state = SourceState::Error(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        match self.state {
            SourceState::Opened | SourceState::Running => {}
            _ => return Err(anyhow!("cannot read frame in state {:?}", self.state)),
        }
        match self.inner.read_frame().await {
            Ok(Some(frame)) => {
                self.state = SourceState::Running;
                Ok(Some(frame))
            }
            Ok(None) => {
                self.state = SourceState::Stopped;
                Ok(None)
            }
            Err(e) => {
                self.state = SourceState::Error(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn close(&mut self) -> Result<()> {
        if self.state == SourceState::Closed {
            return Ok(());
        }
        let result = self.inner.close().await;
        self.state = SourceState::Closed;
        result
    }
}
