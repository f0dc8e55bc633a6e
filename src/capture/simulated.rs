//! Scripted synthetic camera. Each script step yields one frame: either a
//! blank frame or a frame carrying a rendered EAN-13 strip, so the real
//! detector exercises the full pixel path.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::detect::ean13;
use crate::frame::Frame;

use super::FrameSource;

/// One scripted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Frame with no symbol in view.
    Blank,
    /// Frame showing the given EAN-13 payload (13 digits including the
    /// check digit; see [`ean13::with_checksum`] to build one).
    Barcode(String),
}

pub struct SimulatedCamera {
    width: u32,
    height: u32,
    script: Vec<ScriptStep>,
    cursor: usize,
    looping: bool,
    frame_delay: Duration,
    opened: bool,
}

impl SimulatedCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            script: Vec::new(),
            cursor: 0,
            looping: false,
            frame_delay: Duration::ZERO,
            opened: false,
        }
    }

    pub fn with_script(mut self, script: Vec<ScriptStep>) -> Self {
        self.script = script;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    fn synthesize(&self, step: &ScriptStep) -> Result<Frame> {
        let mut frame = Frame::blank(self.width, self.height);
        if let ScriptStep::Barcode(digits) = step {
            // Widest unit that still fits the frame with quiet zones.
            let unit = ((self.width as usize) / 120).max(1);
            let strip = ean13::render_strip(digits, unit)
                .ok_or_else(|| anyhow!("invalid scripted payload {digits:?}"))?;
            if strip.len() > self.width as usize {
                return Err(anyhow!(
                    "strip for {digits:?} is {} px, frame is only {} wide",
                    strip.len(),
                    self.width
                ));
            }
            let x0 = (self.width as usize - strip.len()) / 2;
            let band = (self.height / 3).max(1);
            let y0 = (self.height - band) / 2;
            for y in y0..y0 + band {
                let row = frame.row_mut(y);
                row[x0..x0 + strip.len()].copy_from_slice(&strip);
            }
        }
        Ok(frame)
    }
}

#[async_trait]
impl FrameSource for SimulatedCamera {
    async fn configure(&mut self, config: Value) -> Result<()> {
        if self.opened {
            return Err(anyhow!("cannot configure an opened camera"));
        }
        if let Some(w) = config["width"].as_u64() {
            self.width = w as u32;
        }
        if let Some(h) = config["height"].as_u64() {
            self.height = h as u32;
        }
        if let Some(ms) = config["frame_delay_ms"].as_u64() {
            self.frame_delay = Duration::from_millis(ms);
        }
        if let Some(looping) = config["looping"].as_bool() {
            self.looping = looping;
        }
        Ok(())
    }

    async fn open(&mut self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(anyhow!("simulated camera needs a nonzero resolution"));
        }
        self.opened = true;
        self.cursor = 0;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        if !self.opened {
            return Err(anyhow!("camera not opened"));
        }
        if !self.frame_delay.is_zero() {
            tokio::time::sleep(self.frame_delay).await;
        }
        if self.cursor >= self.script.len() {
            if self.looping && !self.script.is_empty() {
                self.cursor = 0;
            } else {
                return Ok(None);
            }
        }
        let step = self.script[self.cursor].clone();
        self.cursor += 1;
        self.synthesize(&step).map(Some)
    }

    async fn close(&mut self) -> Result<()> {
        self.opened = false;
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        if self.opened {
            (self.width, self.height)
        } else {
            (0, 0)
        }
    }
}
