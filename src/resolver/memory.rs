use std::collections::HashMap;

use async_trait::async_trait;

use super::{LookupOutcome, ProductRecord, ProductResolver};

/// In-memory catalog for demos and tests. Can be constructed permanently
/// unavailable to simulate a degraded store.
pub struct StaticCatalog {
    records: HashMap<String, ProductRecord>,
    available: bool,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            available: true,
        }
    }

    pub fn with_records(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Catalog that answers every lookup with `Unavailable` and fails its
    /// liveness probe.
    pub fn unavailable() -> Self {
        Self {
            records: HashMap::new(),
            available: false,
        }
    }

    pub fn insert(&mut self, record: ProductRecord) {
        self.records.insert(record.barcode.clone(), record);
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductResolver for StaticCatalog {
    async fn lookup(&self, barcode: &str) -> LookupOutcome {
        if !self.available {
            return LookupOutcome::Unavailable("catalog offline".to_string());
        }
        match self.records.get(barcode) {
            Some(record) => LookupOutcome::Found(record.clone()),
            None => LookupOutcome::NotFound,
        }
    }

    async fn ping(&self) -> bool {
        self.available
    }
}
