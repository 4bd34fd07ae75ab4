//! Shared types for the spoolbridge workspace.
//!
//! This crate holds the data model that every other crate speaks: feeder unit
//! identifiers, raw and normalized tray readings, unit snapshots, and the
//! tray normalizer that sits at the boundary between printer telemetry and
//! the reconciliation engine.
//!
//! # Example
//!
//! ```
//! use spoolbridge_core::{AmsUnitId, RawTray, normalize};
//!
//! let raw: RawTray = serde_json::from_value(serde_json::json!({
//!     "id": "0",
//!     "remain": 80,
//!     "tray_uuid": "A1B2C3D4E5F60718293A4B5C6D7E8F90",
//!     "tray_color": "FF6A13FF",
//!     "tray_sub_brands": "PLA Basic",
//!     "tray_weight": "1000"
//! }))
//! .unwrap();
//!
//! let tray = normalize(AmsUnitId::A, &raw).unwrap();
//! assert_eq!(tray.remaining_weight(), 800.0);
//! assert_eq!(tray.label(), "A0");
//! ```

pub mod constants;
pub mod error;
pub mod normalize;
pub mod types;

pub use error::{Error, Result};
pub use normalize::{TrayRejection, classify, normalize};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
