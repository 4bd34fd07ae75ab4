//! Reconciliation engine for spoolbridge.
//!
//! Takes feeder unit snapshots from a printer and keeps the inventory
//! catalog in step with them:
//!
//! - [`matcher`]: tray label and color to external and internal filament types
//! - [`resolver`]: matched tray to an inventory spool decision
//! - [`reconciler`]: change detection, pass locking and catalog writes
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use spoolbridge_catalog::InMemoryCatalog;
//! use spoolbridge_core::{AmsUnitId, RawTray, TagField, UnitSnapshot};
//! use spoolbridge_engine::{PrinterReconciler, ReconcileContext, UnitOutcome};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let context = Arc::new(ReconcileContext::new(
//!         Arc::new(InMemoryCatalog::new()),
//!         TagField::default(),
//!         None,
//!     ));
//!     let mut reconciler = PrinterReconciler::new("01S00C000000001", context);
//!
//!     let snapshot = UnitSnapshot::new(AmsUnitId::A, vec![RawTray::empty("0")]);
//!     let first = reconciler.process_unit(snapshot.clone(), Utc::now()).await.unwrap();
//!     assert!(matches!(first, UnitOutcome::Processed(_)));
//!
//!     let second = reconciler.process_unit(snapshot, Utc::now()).await.unwrap();
//!     assert_eq!(second, UnitOutcome::Unchanged);
//! }
//! ```

pub mod error;
pub mod matcher;
pub mod reconciler;
pub mod resolver;

pub use error::{ReconcileError, ReconcileResult};
pub use matcher::{candidate_prefixes, match_external, match_internal};
pub use reconciler::{
    PrinterReconciler, ReconcileContext, TrayAction, TrayOutcome, UnitOutcome, UnitResult,
};
pub use resolver::{SpoolDecision, resolve};
