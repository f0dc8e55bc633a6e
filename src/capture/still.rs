//! File-backed frame source: reads image files from a directory in sorted
//! order, converts each to luma, then reports end of stream.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::frame::Frame;

use super::FrameSource;

pub struct StillSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    last_resolution: (u32, u32),
    opened: bool,
}

impl StillSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            cursor: 0,
            last_resolution: (0, 0),
            opened: false,
        }
    }
}

#[async_trait]
impl FrameSource for StillSource {
    async fn configure(&mut self, config: Value) -> Result<()> {
        if self.opened {
            return Err(anyhow!("cannot configure an opened source"));
        }
        if let Some(dir) = config["dir"].as_str() {
            self.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    async fn open(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("cannot open still directory {}", self.dir.display()))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(anyhow!("no files in {}", self.dir.display()));
        }
        self.files = files;
        self.cursor = 0;
        self.opened = true;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        if !self.opened {
            return Err(anyhow!("source not opened"));
        }
        // Unreadable files are skipped, not fatal: one bad file must not end
        // the stream.
        while self.cursor < self.files.len() {
            let path = self.files[self.cursor].clone();
            self.cursor += 1;
            match image::open(&path) {
                Ok(img) => {
                    let luma = img.to_luma8();
                    let (w, h) = luma.dimensions();
                    self.last_resolution = (w, h);
                    return Ok(Some(Frame::from_raw(w, h, luma.into_raw())?));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable image");
                }
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        self.opened = false;
        self.files.clear();
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        self.last_resolution
    }
}
