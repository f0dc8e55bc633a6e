//! HTTP document-catalog client: exact-match lookup by barcode plus a cheap
//! health probe. Every failure mode — connect, timeout, non-2xx, malformed
//! body — collapses to `Unavailable`.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::{LookupOutcome, ProductRecord, ProductResolver};

pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ProductResolver for HttpCatalog {
    async fn lookup(&self, barcode: &str) -> LookupOutcome {
        let url = format!("{}/products/{}", self.base_url, barcode);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return LookupOutcome::Unavailable(e.to_string()),
        };
        let status = response.status();
        if status.is_success() {
            match response.json::<ProductRecord>().await {
                Ok(record) => LookupOutcome::Found(record),
                Err(e) => LookupOutcome::Unavailable(format!("malformed record body: {e}")),
            }
        } else if status == reqwest::StatusCode::NOT_FOUND {
            LookupOutcome::NotFound
        } else {
            LookupOutcome::Unavailable(format!("catalog returned {status}"))
        }
    }

    async fn ping(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(r) => r.status().is_success(),
            Err(_) => false,
        }
    }
}
