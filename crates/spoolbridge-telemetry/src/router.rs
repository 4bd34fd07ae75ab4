//! Report routing.
//!
//! The transport layer hands every received message to a [`ReportRouter`],
//! which resolves the printer from the topic, decodes the payload, and
//! queues a [`TelemetryEvent`] on that printer's worker. Each printer has a
//! bounded channel, so reports of one printer are processed strictly in
//! arrival order. Routing waits while the target queue is full, which holds
//! back the caller's later messages for every printer, so a single-reader
//! transport feeding all printers is paced by its slowest worker.

use crate::error::{TelemetryError, TelemetryResult};
use crate::report::{decode_report, printer_id_from_topic};
use crate::worker::TelemetryEvent;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Cheaply clonable map from printer id to worker queue.
#[derive(Clone, Default)]
pub struct ReportRouter {
    workers: Arc<HashMap<String, mpsc::Sender<TelemetryEvent>>>,
}

impl ReportRouter {
    pub(crate) fn new(workers: HashMap<String, mpsc::Sender<TelemetryEvent>>) -> Self {
        Self {
            workers: Arc::new(workers),
        }
    }

    /// Route one received message.
    ///
    /// Payloads without feeder data still count as printer activity.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidTopic`] for non-report topics,
    /// [`TelemetryError::UnknownPrinter`] for unregistered printers, and
    /// [`TelemetryError::WorkerStopped`] once the printer's worker has exited.
    pub async fn route(&self, topic: &str, payload: &[u8]) -> TelemetryResult<()> {
        let printer_id = printer_id_from_topic(topic)
            .ok_or_else(|| TelemetryError::InvalidTopic(topic.to_string()))?;

        let received_at = Utc::now();
        let event = match decode_report(payload) {
            Some(units) => TelemetryEvent::Report { received_at, units },
            None => TelemetryEvent::Activity { received_at },
        };
        trace!(printer = printer_id, event = event.kind(), "Routing report");

        self.send(printer_id, event).await
    }

    /// Queue an event for a printer's worker.
    ///
    /// # Errors
    ///
    /// See [`ReportRouter::route`].
    pub async fn send(&self, printer_id: &str, event: TelemetryEvent) -> TelemetryResult<()> {
        let worker = self
            .workers
            .get(printer_id)
            .ok_or_else(|| TelemetryError::UnknownPrinter(printer_id.to_string()))?;

        worker
            .send(event)
            .await
            .map_err(|_| TelemetryError::WorkerStopped(printer_id.to_string()))
    }
}
