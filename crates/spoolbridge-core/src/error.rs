use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Telemetry errors
    #[error("Invalid feeder unit id: {0}")]
    InvalidUnitId(String),

    #[error("Invalid tray color: {0}")]
    InvalidColor(String),

    // Lookup errors
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

impl Error {
    /// Create a not-found error for the given entity kind and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let error = Error::not_found("printer", "01S00C123456789");
        assert_eq!(error.to_string(), "printer not found: 01S00C123456789");
    }

    #[test]
    fn test_invalid_unit_display() {
        let error = Error::InvalidUnitId("7".to_string());
        assert_eq!(error.to_string(), "Invalid feeder unit id: 7");
    }
}
