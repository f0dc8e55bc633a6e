use serde::{Deserialize, Serialize};

/// Owned 8-bit luma pixel buffer produced by a frame source.
///
/// A frame is owned by the capture loop for exactly one iteration; anything
/// that needs it past the iteration (the renderer) takes a clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major luma bytes, `width * height` long. 0 = black, 255 = white.
    pub data: Vec<u8>,
}

impl Frame {
    /// All-white frame of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![255u8; (width as usize) * (height as usize)],
        }
    }

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> anyhow::Result<Self> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            anyhow::bail!(
                "frame buffer length {} does not match {}x{}",
                data.len(),
                width,
                height
            );
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = (y as usize) * w;
        &self.data[start..start + w]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let w = self.width as usize;
        let start = (y as usize) * w;
        &mut self.data[start..start + w]
    }

    /// Set a pixel, silently ignoring out-of-bounds coordinates.
    /// Overlay drawing clips against the frame edge this way.
    pub fn put(&mut self, x: i64, y: i64, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + x as usize;
        self.data[idx] = value;
    }
}

/// Integer rectangle in frame coordinates (x, y is the top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}
