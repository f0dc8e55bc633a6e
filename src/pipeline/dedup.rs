use crate::detect::Detection;

/// What the gate is currently tracking. `Tracking` holds the payload of the
/// most recent frame that contained at least one symbol; any empty frame
/// resets to `Idle`, so re-presenting the same barcode after a gap triggers
/// a fresh scan event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Tracking(String),
}

/// A barcode not equal to the immediately-preceding tracked one is now in
/// view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScan {
    pub payload: String,
}

/// Stateful per-frame filter that turns the high-rate detection stream into
/// a low-rate stream of new-scan events. Only the first detected symbol per
/// frame participates: point-of-sale scanning presents one item at a time,
/// and multi-symbol frames are not fanned out into multiple events.
pub struct DeduplicationGate {
    state: ScanState,
}

impl DeduplicationGate {
    pub fn new() -> Self {
        Self {
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    /// Evaluate one frame's detections. Emits on `Idle -> Tracking` and on a
    /// payload switch while tracking; holding the same barcode in view emits
    /// nothing.
    pub fn observe(&mut self, detection: &Detection) -> Option<NewScan> {
        match detection.first() {
            None => {
                self.state = ScanState::Idle;
                None
            }
            Some(symbol) => {
                let emit = match &self.state {
                    ScanState::Idle => true,
                    ScanState::Tracking(current) => current != &symbol.payload,
                };
                self.state = ScanState::Tracking(symbol.payload.clone());
                emit.then(|| NewScan {
                    payload: symbol.payload.clone(),
                })
            }
        }
    }
}

impl Default for DeduplicationGate {
    fn default() -> Self {
        Self::new()
    }
}
