//! Per-printer worker task.
//!
//! Each registered printer gets one [`PrinterWorker`]. It drains the
//! printer's event queue, keeps the shared [`PrinterInfo`] current, and runs
//! the printer's reconciler on every feeder report. Cancellation is observed
//! only while waiting for the next event, so a pass that has started always
//! runs to completion.

use crate::printer::{PrinterInfo, PrinterStatus};
use chrono::{DateTime, Utc};
use spoolbridge_catalog::CatalogClient;
use spoolbridge_core::UnitSnapshot;
use spoolbridge_engine::{PrinterReconciler, UnitResult};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Event delivered to a printer's worker.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    /// The telemetry feed of the printer came up.
    Connected,

    /// The telemetry feed of the printer went down.
    Disconnected,

    /// A report carrying feeder data.
    Report {
        received_at: DateTime<Utc>,
        units: Vec<UnitSnapshot>,
    },

    /// A report without feeder data.
    Activity { received_at: DateTime<Utc> },
}

impl TelemetryEvent {
    /// Short name used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Report { .. } => "report",
            Self::Activity { .. } => "activity",
        }
    }
}

pub struct PrinterWorker<C> {
    reconciler: PrinterReconciler<C>,
    events: mpsc::Receiver<TelemetryEvent>,
    info: Arc<RwLock<PrinterInfo>>,
    cancel: CancellationToken,
}

impl<C: CatalogClient> PrinterWorker<C> {
    pub fn new(
        reconciler: PrinterReconciler<C>,
        events: mpsc::Receiver<TelemetryEvent>,
        info: Arc<RwLock<PrinterInfo>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            reconciler,
            events,
            info,
            cancel,
        }
    }

    /// Process events until cancelled or every sender is dropped.
    pub async fn run(mut self) {
        let printer = self.reconciler.printer_id().to_string();
        info!(printer = %printer, "Printer worker started");

        loop {
            let event = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!(printer = %printer, "Printer worker cancelled");
                    break;
                }
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => {
                        debug!(printer = %printer, "Event queue closed");
                        break;
                    }
                },
            };

            self.handle(event).await;
        }

        self.set_status(PrinterStatus::Disconnected);
        info!(printer = %printer, "Printer worker stopped");
    }

    /// Apply one event. Returns the per-unit results of a feeder report.
    pub async fn handle(&mut self, event: TelemetryEvent) -> Vec<UnitResult> {
        match event {
            TelemetryEvent::Connected => {
                info!(printer = %self.reconciler.printer_id(), "Printer connected");
                self.set_status(PrinterStatus::Connected);
                Vec::new()
            }
            TelemetryEvent::Disconnected => {
                warn!(printer = %self.reconciler.printer_id(), "Printer disconnected");
                self.set_status(PrinterStatus::Disconnected);
                Vec::new()
            }
            TelemetryEvent::Activity { received_at } => {
                self.update_info(|info| info.last_message = Some(received_at));
                Vec::new()
            }
            TelemetryEvent::Report { received_at, units } => {
                let active_trays = units
                    .iter()
                    .flat_map(|unit| &unit.trays)
                    .filter(|tray| !tray.is_empty_slot())
                    .count();
                let unit_count = units.len();

                self.update_info(|info| {
                    info.last_message = Some(received_at);
                    info.last_ams_message = Some(received_at);
                    info.ams_unit_count = Some(unit_count);
                    info.active_tray_count = Some(active_trays);
                });

                debug!(
                    printer = %self.reconciler.printer_id(),
                    units = unit_count,
                    active_trays,
                    "Feeder report received"
                );

                self.reconciler.process_units(units, received_at).await
            }
        }
    }

    fn set_status(&self, status: PrinterStatus) {
        self.update_info(|info| info.status = status);
    }

    fn update_info(&self, apply: impl FnOnce(&mut PrinterInfo)) {
        let mut info = self.info.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut info);
    }
}
