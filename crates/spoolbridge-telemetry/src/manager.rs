//! Printer worker manager.
//!
//! [`PrinterManager`] collects printer registrations and spawns one
//! [`PrinterWorker`] per printer. Every worker shares the same
//! [`ReconcileContext`], so passes of different printers are serialized by
//! its pass lock while their event queues stay independent.
//!
//! ```text
//!                     ┌──────────────┐     ┌──────────┐
//!            ┌───────►│ queue P1     │────►│ Worker P1│──┐
//! ┌────────┐ │        └──────────────┘     └──────────┘  │   ┌─────────────┐
//! │ Router │─┤                                           ├──►│ Context     │──► Catalog
//! └────────┘ │        ┌──────────────┐     ┌──────────┐  │   │ (pass lock) │
//!            └───────►│ queue P2     │────►│ Worker P2│──┘   └─────────────┘
//!                     └──────────────┘     └──────────┘
//! ```
//!
//! # Examples
//!
//! ```
//! use spoolbridge_catalog::{AnyCatalog, InMemoryCatalog};
//! use spoolbridge_core::TagField;
//! use spoolbridge_engine::ReconcileContext;
//! use spoolbridge_telemetry::{PrinterConfig, PrinterManager, PrinterStatus};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> spoolbridge_telemetry::TelemetryResult<()> {
//!     let catalog = Arc::new(AnyCatalog::from(InMemoryCatalog::new()));
//!     let context = Arc::new(ReconcileContext::new(catalog, TagField::default(), None));
//!
//!     let mut manager = PrinterManager::new(context);
//!     manager.register(PrinterConfig {
//!         id: "01S00C000000001".to_string(),
//!         ip: "192.168.1.50".to_string(),
//!         access_code: "12345678".to_string(),
//!     })?;
//!
//!     let handle = manager.start();
//!     let printer = handle.printer("01S00C000000001").unwrap();
//!     assert_eq!(printer.status, PrinterStatus::Disconnected);
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

use crate::error::{TelemetryError, TelemetryResult};
use crate::printer::{PrinterConfig, PrinterInfo};
use crate::router::ReportRouter;
use crate::worker::PrinterWorker;
use spoolbridge_catalog::AnyCatalog;
use spoolbridge_core::Error;
use spoolbridge_engine::{PrinterReconciler, ReconcileContext};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Capacity of each printer's event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Registers printers and spawns their workers.
pub struct PrinterManager {
    context: Arc<ReconcileContext<AnyCatalog>>,
    printers: Vec<PrinterConfig>,
    queue_capacity: usize,
}

impl PrinterManager {
    pub fn new(context: Arc<ReconcileContext<AnyCatalog>>) -> Self {
        Self {
            context,
            printers: Vec::new(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Override the per-printer queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Register a printer.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::DuplicatePrinter`] if the id is already registered.
    pub fn register(&mut self, config: PrinterConfig) -> TelemetryResult<()> {
        if self.printers.iter().any(|p| p.id == config.id) {
            return Err(TelemetryError::DuplicatePrinter(config.id));
        }

        info!(printer = %config.id, ip = %config.ip, "Printer registered");
        self.printers.push(config);
        Ok(())
    }

    /// Number of registered printers.
    pub fn printer_count(&self) -> usize {
        self.printers.len()
    }

    /// Spawn one worker per registered printer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> PrinterHandle {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        let mut senders = HashMap::with_capacity(self.printers.len());
        let mut statuses = Vec::with_capacity(self.printers.len());

        for config in &self.printers {
            let (tx, rx) = mpsc::channel(self.queue_capacity);
            let info = Arc::new(RwLock::new(PrinterInfo::new(config)));
            let reconciler = PrinterReconciler::new(config.id.clone(), Arc::clone(&self.context));
            let worker = PrinterWorker::new(reconciler, rx, Arc::clone(&info), cancel.clone());

            tasks.spawn(worker.run());
            senders.insert(config.id.clone(), tx);
            statuses.push(info);
        }

        info!(printers = statuses.len(), "Printer workers started");

        PrinterHandle {
            tasks,
            cancel,
            router: ReportRouter::new(senders),
            statuses,
        }
    }
}

/// Running printer workers.
pub struct PrinterHandle {
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    router: ReportRouter,
    /// In registration order.
    statuses: Vec<Arc<RwLock<PrinterInfo>>>,
}

impl PrinterHandle {
    /// Router feeding the workers. Clones share the same queues.
    pub fn router(&self) -> ReportRouter {
        self.router.clone()
    }

    /// Snapshot of every printer, in registration order.
    pub fn printers(&self) -> Vec<PrinterInfo> {
        snapshot(&self.statuses)
    }

    /// Snapshot of one printer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no printer has this id.
    pub fn printer(&self, printer_id: &str) -> spoolbridge_core::Result<PrinterInfo> {
        self.statuses
            .iter()
            .map(|info| info.read().unwrap_or_else(PoisonError::into_inner))
            .find(|info| info.printer_id == printer_id)
            .map(|info| info.clone())
            .ok_or_else(|| Error::not_found("printer", printer_id))
    }

    /// Stop every worker and wait for them to exit. Returns the final
    /// state of every printer.
    ///
    /// Workers finish the event they are handling before observing the
    /// cancellation. Events still queued are discarded.
    pub async fn shutdown(self) -> Vec<PrinterInfo> {
        self.cancel.cancel();
        Self::join(self.tasks).await;
        snapshot(&self.statuses)
    }

    /// Close the queues and wait until every queued event is processed.
    /// Returns the final state of every printer.
    ///
    /// Workers exit once their queue is empty and every sender is gone, so
    /// all clones of [`PrinterHandle::router`] must be dropped first or this
    /// waits until they are.
    pub async fn drain(self) -> Vec<PrinterInfo> {
        let Self {
            tasks,
            router,
            statuses,
            ..
        } = self;
        drop(router);
        Self::join(tasks).await;
        snapshot(&statuses)
    }

    async fn join(mut tasks: JoinSet<()>) {
        let mut panic_count = 0;
        let mut cancelled_count = 0;

        while let Some(result) = tasks.join_next().await {
            match Self::classify_task_result(result) {
                TaskTermination::Success => {}
                TaskTermination::Cancelled => cancelled_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        if panic_count > 0 || cancelled_count > 0 {
            warn!(
                panicked = panic_count,
                cancelled = cancelled_count,
                "Printer workers terminated abnormally"
            );
        }
        info!("Printer workers stopped");
    }

    /// Classify the termination status of a worker task.
    fn classify_task_result(result: Result<(), JoinError>) -> TaskTermination {
        match result {
            Ok(()) => TaskTermination::Success,
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(_) => TaskTermination::Panic,
        }
    }
}

fn snapshot(statuses: &[Arc<RwLock<PrinterInfo>>]) -> Vec<PrinterInfo> {
    statuses
        .iter()
        .map(|info| info.read().unwrap_or_else(PoisonError::into_inner).clone())
        .collect()
}

/// Task termination classification for shutdown handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    /// Aborted before completing, e.g. by a runtime shutdown
    Cancelled,
    Panic,
}
