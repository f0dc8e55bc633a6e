use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Process configuration, loaded from a JSON file or defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub catalog: CatalogConfig,
    pub delivery: DeliveryConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub device_index: u32,
    /// Best-effort; the source reports what it actually negotiated.
    pub requested_width: Option<u32>,
    pub requested_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// How many evenly spaced rows the detector probes per frame.
    pub scan_band_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliveryConfig {
    pub target_url: String,
    pub timeout_ms: u64,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub show_fps: bool,
    pub box_thickness: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            detector: DetectorConfig::default(),
            catalog: CatalogConfig::default(),
            delivery: DeliveryConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            requested_width: None,
            requested_height: None,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { scan_band_rows: 9 }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: 3_000,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            target_url: "http://127.0.0.1:8080/cart".to_string(),
            timeout_ms: 10_000,
            queue_capacity: 64,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_fps: true,
            box_thickness: 2,
        }
    }
}

impl ScannerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("cannot parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog.base_url.is_empty() {
            anyhow::bail!("catalog.base_url must not be empty");
        }
        if self.delivery.target_url.is_empty() {
            anyhow::bail!("delivery.target_url must not be empty");
        }
        if self.delivery.queue_capacity == 0 {
            anyhow::bail!("delivery.queue_capacity must be nonzero");
        }
        if self.delivery.timeout_ms == 0 || self.catalog.request_timeout_ms == 0 {
            anyhow::bail!("timeouts must be nonzero");
        }
        if self.detector.scan_band_rows == 0 {
            anyhow::bail!("detector.scan_band_rows must be nonzero");
        }
        Ok(())
    }
}
