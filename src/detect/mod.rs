pub mod ean13;

pub use ean13::Ean13Detector;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::frame::{Frame, Rect};

/// Barcode encoding standard a decoded payload conforms to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Symbology {
    Ean13,
    UpcA,
}

/// One decoded symbol from a single frame. Immutable; discarded once the
/// frame's processing completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSymbol {
    pub payload: String,
    pub symbology: Symbology,
    pub bounds: Rect,
}

/// Detector output for one frame. Latency is diagnostic only.
#[derive(Debug, Clone)]
pub struct Detection {
    pub symbols: Vec<DetectedSymbol>,
    pub latency: Duration,
}

impl Detection {
    pub fn empty() -> Self {
        Self {
            symbols: Vec::new(),
            latency: Duration::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Only the first symbol per frame participates in de-duplication.
    pub fn first(&self) -> Option<&DetectedSymbol> {
        self.symbols.first()
    }
}

/// Pure per-frame symbol decoding seam.
pub trait SymbolDetector: Send {
    fn detect(&self, frame: &Frame) -> Detection;
}
