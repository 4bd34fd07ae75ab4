use serde::{Deserialize, Serialize};
use spoolbridge_core::constants::{DEFAULT_SPOOL_WEIGHT, VENDOR_NAME};

/// Filament manufacturer registered in the inventory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub empty_spool_weight: Option<f64>,
}

/// Payload for registering a vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVendor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_spool_weight: Option<f64>,
}

impl NewVendor {
    /// The vendor whose trays the bridge reconciles.
    pub fn bambu_lab() -> Self {
        Self {
            name: VENDOR_NAME.to_string(),
            external_id: Some(VENDOR_NAME.to_string()),
            empty_spool_weight: Some(DEFAULT_SPOOL_WEIGHT),
        }
    }
}
