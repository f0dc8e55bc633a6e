pub mod dedup;
pub mod payload;
pub mod queue;
pub mod worker;

pub use dedup::{DeduplicationGate, NewScan, ScanState};
pub use payload::{build_payload, parse_price, OutboundPayload};
pub use queue::{DeliveryQueue, QueueEntry};
pub use worker::{DeliveryOutcome, DeliveryStats, DeliveryWorker};
