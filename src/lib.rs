//! Real-time point-of-sale scanning pipeline: frames in, de-duplicated
//! checkout events out over HTTP.

pub mod broadcast;
pub mod capture;
pub mod config;
pub mod detect;
pub mod frame;
pub mod metrics;
pub mod pipeline;
pub mod render;
pub mod resolver;
pub mod scanner;

pub use config::ScannerConfig;
pub use scanner::{ScanReport, ScannerContext};
