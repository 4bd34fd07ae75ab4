use thiserror::Error;

/// Errors raised while routing printer reports to workers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Topic is not a printer report topic
    #[error("Not a report topic: {0}")]
    InvalidTopic(String),

    /// No worker is registered for the printer
    #[error("Unknown printer: {0}")]
    UnknownPrinter(String),

    /// A printer with the same id is already registered
    #[error("Printer registered twice: {0}")]
    DuplicatePrinter(String),

    /// The printer's worker has stopped
    #[error("Worker for printer {0} is not running")]
    WorkerStopped(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
