//! Mapping from a lookup outcome to the outbound wire payload.
//!
//! The asymmetry here is deliberate: a found record that is missing its
//! display fields (or whose price cannot be parsed) is dropped without a
//! payload, while a failed or empty lookup still produces one so the
//! downstream cart is informed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolver::LookupOutcome;

/// Purchase-ready payload delivered to the cart service. Serialized with a
/// `status` discriminator on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutboundPayload {
    Success {
        scanned_barcode: String,
        name: String,
        price: f64,
        quantity: u32,
    },
    NotFound {
        scanned_barcode: String,
    },
    LookupUnavailable {
        scanned_barcode: String,
    },
}

impl OutboundPayload {
    pub fn barcode(&self) -> &str {
        match self {
            Self::Success {
                scanned_barcode, ..
            }
            | Self::NotFound { scanned_barcode }
            | Self::LookupUnavailable { scanned_barcode } => scanned_barcode,
        }
    }
}

/// Build the outbound payload for one new-scan event. `None` means the event
/// is swallowed (record missing name/price, or unparseable price).
pub fn build_payload(barcode: &str, outcome: LookupOutcome) -> Option<OutboundPayload> {
    match outcome {
        LookupOutcome::Found(record) => {
            let name = record.name.as_deref().filter(|n| !n.is_empty());
            let price = record.price.as_ref().and_then(price_value);
            match (name, price) {
                (Some(name), Some(price)) => Some(OutboundPayload::Success {
                    scanned_barcode: barcode.to_string(),
                    name: name.to_string(),
                    price,
                    quantity: 1,
                }),
                _ => {
                    tracing::warn!(
                        barcode,
                        "record found but missing name or parseable price, dropping event"
                    );
                    None
                }
            }
        }
        LookupOutcome::NotFound => {
            tracing::info!(barcode, "barcode not in catalog");
            Some(OutboundPayload::NotFound {
                scanned_barcode: barcode.to_string(),
            })
        }
        LookupOutcome::Unavailable(reason) => {
            tracing::warn!(barcode, %reason, "catalog unavailable for lookup");
            Some(OutboundPayload::LookupUnavailable {
                scanned_barcode: barcode.to_string(),
            })
        }
    }
}

/// Numeric price from a record field that may be a bare number or a display
/// string like `"30,000 VND"`.
fn price_value(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_price(s),
        _ => None,
    }
}

/// Extract the first numeric run from a price string: digits with embedded
/// thousands separators and an optional decimal fraction. Separator commas
/// are stripped before parsing.
pub fn parse_price(raw: &str) -> Option<f64> {
    let bytes = raw.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;

    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b',') {
        end += 1;
    }
    let mut run: String = raw[start..end].chars().filter(|&c| c != ',').collect();

    // Optional fraction directly after the integer run.
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            run.push('.');
            run.push_str(&raw[frac_start..frac_end]);
        }
    }

    run.parse().ok()
}
