use std::time::Duration;

use lanescan::detect::{DetectedSymbol, Detection, Symbology};
use lanescan::frame::Rect;
use lanescan::pipeline::{DeduplicationGate, ScanState};

fn detection(payloads: &[&str]) -> Detection {
    Detection {
        symbols: payloads
            .iter()
            .map(|p| DetectedSymbol {
                payload: p.to_string(),
                symbology: Symbology::Ean13,
                bounds: Rect::new(0, 0, 10, 10),
            })
            .collect(),
        latency: Duration::ZERO,
    }
}

fn empty() -> Detection {
    Detection::empty()
}

#[test]
fn same_payload_held_in_view_emits_once() {
    let mut gate = DeduplicationGate::new();
    let mut events = 0;
    for _ in 0..5 {
        if gate.observe(&detection(&["4006381333931"])).is_some() {
            events += 1;
        }
    }
    assert_eq!(events, 1);
    assert_eq!(
        gate.state(),
        &ScanState::Tracking("4006381333931".to_string())
    );
}

#[test]
fn gap_retriggers_same_payload() {
    let mut gate = DeduplicationGate::new();
    let first = gate.observe(&detection(&["A"]));
    let held = gate.observe(&detection(&["A"]));
    let gap = gate.observe(&empty());
    let again = gate.observe(&detection(&["A"]));

    assert_eq!(first.map(|s| s.payload), Some("A".to_string()));
    assert!(held.is_none());
    assert!(gap.is_none());
    assert_eq!(again.map(|s| s.payload), Some("A".to_string()));
}

#[test]
fn switch_without_gap_retriggers() {
    let mut gate = DeduplicationGate::new();
    let a = gate.observe(&detection(&["A"]));
    let held = gate.observe(&detection(&["A"]));
    let b = gate.observe(&detection(&["B"]));

    assert_eq!(a.map(|s| s.payload), Some("A".to_string()));
    assert!(held.is_none());
    assert_eq!(b.map(|s| s.payload), Some("B".to_string()));
}

#[test]
fn empty_frames_keep_gate_idle() {
    let mut gate = DeduplicationGate::new();
    assert!(gate.observe(&empty()).is_none());
    assert!(gate.observe(&empty()).is_none());
    assert_eq!(gate.state(), &ScanState::Idle);
}

#[test]
fn empty_frame_resets_tracking() {
    let mut gate = DeduplicationGate::new();
    gate.observe(&detection(&["A"]));
    gate.observe(&empty());
    assert_eq!(gate.state(), &ScanState::Idle);
}

#[test]
fn only_first_symbol_participates() {
    let mut gate = DeduplicationGate::new();
    // A multi-symbol frame is not fanned out: only "A" is tracked.
    let event = gate.observe(&detection(&["A", "B"]));
    assert_eq!(event.map(|s| s.payload), Some("A".to_string()));

    // Repeating the same multi-symbol frame emits nothing further.
    assert!(gate.observe(&detection(&["A", "B"])).is_none());

    // "B" moving to the front is a payload switch.
    let switched = gate.observe(&detection(&["B", "A"]));
    assert_eq!(switched.map(|s| s.payload), Some("B".to_string()));
}
