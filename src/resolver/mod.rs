pub mod http;
pub mod memory;

pub use http::HttpCatalog;
pub use memory::StaticCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-only product snapshot fetched per lookup; never cached or mutated.
/// Catalog fields beyond name and price ride along untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub barcode: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Display price; may be a bare number or a string like `"30,000 VND"`.
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ProductRecord {
    pub fn new(barcode: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            name: None,
            price: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<Value>) -> Self {
        self.price = Some(price.into());
        self
    }
}

/// Result of one catalog lookup. A degraded store produces `Unavailable`,
/// never a hang and never an error that could crash the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(ProductRecord),
    NotFound,
    Unavailable(String),
}

/// Exact-match product lookup seam.
#[async_trait]
pub trait ProductResolver: Send + Sync {
    async fn lookup(&self, barcode: &str) -> LookupOutcome;

    /// Cheap liveness probe. Consulted at startup; a store that is down
    /// degrades lookups to `Unavailable`, it does not abort the run.
    async fn ping(&self) -> bool;

    /// Release any store connection. Idempotent.
    async fn close(&self) {}
}
