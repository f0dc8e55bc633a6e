//! Presentation-only overlay: bounding boxes, payload labels and an FPS
//! readout drawn onto a copy of the frame. Nothing here gates the pipeline.

use std::time::Instant;

use crate::detect::DetectedSymbol;
use crate::frame::{Frame, Rect};

/// Once-per-second frame-rate estimate for the on-screen readout.
pub struct FpsCounter {
    frames: u32,
    window_start: Instant,
    fps: f64,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frames: 0,
            window_start: Instant::now(),
            fps: 0.0,
        }
    }

    /// Count one frame; the published value refreshes once per second.
    pub fn tick(&mut self) -> f64 {
        self.frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs_f64() >= 1.0 {
            self.fps = self.frames as f64 / elapsed.as_secs_f64();
            self.frames = 0;
            self.window_start = Instant::now();
        }
        self.fps
    }

    pub fn current(&self) -> f64 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

const INK: u8 = 0;
const GLYPH_W: i64 = 5;
const GLYPH_H: i64 = 7;

pub struct Renderer {
    pub box_thickness: u32,
    pub show_fps: bool,
}

impl Renderer {
    pub fn new(box_thickness: u32, show_fps: bool) -> Self {
        Self {
            box_thickness: box_thickness.max(1),
            show_fps,
        }
    }

    /// Clone the frame and draw every detection plus the FPS readout.
    pub fn annotate(&self, frame: &Frame, symbols: &[DetectedSymbol], fps: f64) -> Frame {
        let mut out = frame.clone();
        for symbol in symbols {
            self.draw_box(&mut out, &symbol.bounds);
            // Label above the box, or below it when that would clip.
            let label_y = if symbol.bounds.y as i64 - GLYPH_H - 3 > 0 {
                symbol.bounds.y as i64 - GLYPH_H - 3
            } else {
                symbol.bounds.y as i64 + symbol.bounds.h as i64 + 3
            };
            draw_text(&mut out, symbol.bounds.x as i64, label_y, &symbol.payload);
        }
        if self.show_fps {
            draw_text(&mut out, 10, 10, &format!("FPS: {fps:.1}"));
        }
        out
    }

    fn draw_box(&self, frame: &mut Frame, rect: &Rect) {
        let t = self.box_thickness as i64;
        let (x0, y0) = (rect.x as i64, rect.y as i64);
        let (x1, y1) = (x0 + rect.w as i64, y0 + rect.h as i64);
        for i in 0..t {
            for x in x0..=x1 {
                frame.put(x, y0 + i, INK);
                frame.put(x, y1 - i, INK);
            }
            for y in y0..=y1 {
                frame.put(x0 + i, y, INK);
                frame.put(x1 - i, y, INK);
            }
        }
    }
}

fn draw_text(frame: &mut Frame, x: i64, y: i64, text: &str) {
    let mut cx = x;
    for c in text.chars() {
        if let Some(rows) = glyph(c) {
            for (dy, row) in rows.iter().enumerate() {
                for dx in 0..GLYPH_W {
                    if row & (1 << (GLYPH_W - 1 - dx)) != 0 {
                        frame.put(cx + dx, y + dy as i64, INK);
                    }
                }
            }
        }
        cx += GLYPH_W + 1;
    }
}

/// 5x7 glyphs for the characters the overlay actually emits: digits, the
/// FPS caption and punctuation. Unknown characters render as a space.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        _ => return None,
    };
    Some(rows)
}
