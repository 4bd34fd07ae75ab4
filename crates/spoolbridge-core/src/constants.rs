//! Constants shared across the bridge.
//!
//! Sentinel values reported by the printer firmware, the external catalog
//! naming scheme, and the defaults applied when the bridge registers new
//! filament types in the inventory service.
//!
//! # Usage
//!
//! ```
//! use spoolbridge_core::constants::*;
//!
//! assert_eq!(EMPTY_TRAY_UUID.len(), 32);
//! assert!(format!("{EXTERNAL_ID_PREFIX}pla_basic").starts_with("bambulab_"));
//! ```

// ============================================================================
// Printer Sentinels
// ============================================================================

/// Tray UUID reported for slots without an RFID-tagged spool.
pub const EMPTY_TRAY_UUID: &str = "00000000000000000000000000000000";

/// Tray color reported when the firmware has no color information.
pub const EMPTY_TRAY_COLOR: &str = "00000000";

/// Sub-brand label of translucent PETG, which reports [`EMPTY_TRAY_COLOR`].
pub const TRANSLUCENT_PETG_LABEL: &str = "PETG Translucent";

/// Color substituted for translucent PETG (white, fully transparent alpha).
pub const TRANSLUCENT_PETG_COLOR: &str = "FFFFFF00";

/// Number of feeder units a single printer can address.
pub const MAX_AMS_UNITS: u8 = 4;

// ============================================================================
// Catalog Naming
// ============================================================================

/// Prefix of vendor-published external filament ids handled by the bridge.
pub const EXTERNAL_ID_PREFIX: &str = "bambulab_";

/// Vendor name registered in the inventory service.
pub const VENDOR_NAME: &str = "Bambu Lab";

/// Default name of the spool extra field that stores the claiming tray UUID.
pub const DEFAULT_TAG_FIELD: &str = "Tag";

// ============================================================================
// Filament Defaults
// ============================================================================

/// Empty spool (tare) weight in grams used for new filament types and the vendor.
pub const DEFAULT_SPOOL_WEIGHT: f64 = 250.0;

/// Nominal net filament weight in grams of a full spool.
pub const DEFAULT_FILAMENT_WEIGHT: f64 = 1000.0;

// ============================================================================
// Timing
// ============================================================================

/// Timeout in seconds applied to every inventory service request.
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 5;

/// Interval in seconds between inventory service health checks.
pub const DEFAULT_HEALTHCHECK_INTERVAL_SECS: u64 = 3600;
