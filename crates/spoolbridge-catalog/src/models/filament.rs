use super::Vendor;
use serde::{Deserialize, Serialize};
use spoolbridge_core::constants::{DEFAULT_FILAMENT_WEIGHT, DEFAULT_SPOOL_WEIGHT};

/// Filament type from the vendor-published external catalog.
///
/// Multi-color entries carry `color_hexes` instead of `color_hex`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalFilament {
    pub id: String,
    #[serde(default)]
    pub manufacturer: String,
    pub name: String,
    pub material: String,
    pub density: f64,
    pub diameter: f64,
    #[serde(default)]
    pub color_hex: Option<String>,
    #[serde(default)]
    pub color_hexes: Option<Vec<String>>,
    #[serde(default)]
    pub extruder_temp: Option<i32>,
    #[serde(default)]
    pub bed_temp: Option<i32>,
    #[serde(default)]
    pub multi_color_direction: Option<String>,
}

/// Filament type registered in the inventory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalFilament {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vendor: Option<Vendor>,
    #[serde(default)]
    pub material: Option<String>,
    pub density: f64,
    pub diameter: f64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub spool_weight: Option<f64>,
    #[serde(default)]
    pub settings_extruder_temp: Option<i32>,
    #[serde(default)]
    pub settings_bed_temp: Option<i32>,
    #[serde(default)]
    pub color_hex: Option<String>,
    /// Id of the external catalog entry this filament was created from.
    #[serde(default)]
    pub external_id: Option<String>,
}

/// Payload for registering a filament type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFilament {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<i64>,
    pub material: String,
    pub density: f64,
    pub diameter: f64,
    pub weight: f64,
    pub spool_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_extruder_temp: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_bed_temp: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    /// Comma-separated `RRGGBB` list, set instead of `color_hex` for multi-color types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_color_hexes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_color_direction: Option<String>,
    pub external_id: String,
}

impl NewFilament {
    /// Build a filament type from an external catalog entry.
    ///
    /// The material is taken from the tray's sub-brand label rather than the
    /// catalog, and weights use the bridge defaults.
    pub fn from_external(
        external: &ExternalFilament,
        material: impl Into<String>,
        vendor_id: Option<i64>,
    ) -> Self {
        Self {
            name: external.name.clone(),
            vendor_id,
            material: material.into(),
            density: external.density,
            diameter: external.diameter,
            weight: DEFAULT_FILAMENT_WEIGHT,
            spool_weight: DEFAULT_SPOOL_WEIGHT,
            settings_extruder_temp: external.extruder_temp,
            settings_bed_temp: external.bed_temp,
            color_hex: external.color_hex.clone(),
            multi_color_hexes: external
                .color_hexes
                .as_ref()
                .filter(|hexes| !hexes.is_empty())
                .map(|hexes| hexes.join(",")),
            multi_color_direction: external.multi_color_direction.clone(),
            external_id: external.id.clone(),
        }
    }
}
