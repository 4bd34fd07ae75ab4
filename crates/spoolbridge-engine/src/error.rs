use spoolbridge_catalog::CatalogError;
use thiserror::Error;

/// Write failures raised while reconciling a feeder unit.
///
/// Read failures never surface here: listings that cannot be fetched are
/// treated as empty.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Creating a filament type or spool failed
    #[error("Failed to create {entity} for tray {tray}: {source}")]
    CreateFailed {
        entity: &'static str,
        tray: String,
        source: CatalogError,
    },

    /// Patching a spool failed
    #[error("Failed to update spool {spool_id} for tray {tray}: {source}")]
    UpdateFailed {
        spool_id: i64,
        tray: String,
        source: CatalogError,
    },
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
