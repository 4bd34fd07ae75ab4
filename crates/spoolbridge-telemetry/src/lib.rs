//! Printer telemetry intake for spoolbridge.
//!
//! Decodes printer reports, routes them to one worker per printer, and
//! exposes a read-only view of each printer's connection state.
//!
//! - [`report`]: topic parsing and feeder report decoding
//! - [`router`]: topic to worker queue routing
//! - [`worker`]: per-printer event loop driving the reconciler
//! - [`manager`]: worker lifecycle and status snapshots

pub mod error;
pub mod manager;
pub mod printer;
pub mod report;
pub mod router;
pub mod worker;

pub use error::{TelemetryError, TelemetryResult};
pub use manager::{PrinterHandle, PrinterManager};
pub use printer::{MQTT_PORT, MQTT_USERNAME, PrinterConfig, PrinterInfo, PrinterStatus};
pub use report::{decode_report, printer_id_from_topic, report_topic};
pub use router::ReportRouter;
pub use worker::{PrinterWorker, TelemetryEvent};
