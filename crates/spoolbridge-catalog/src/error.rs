use thiserror::Error;

/// Errors returned by inventory catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Request did not complete within the configured timeout
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Service answered with a non-success status
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// Connection or transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl CatalogError {
    /// Returns `true` for errors that indicate the service could not be reached.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        match self {
            CatalogError::Timeout(_) => true,
            CatalogError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

/// Specialized result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let error = CatalogError::Status {
            method: "PATCH",
            url: "http://localhost:7912/api/v1/spool/4".to_string(),
            status: 422,
            body: "invalid extra".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "PATCH http://localhost:7912/api/v1/spool/4 returned 422: invalid extra"
        );
        assert!(!error.is_unreachable());
    }

    #[test]
    fn test_timeout_is_unreachable() {
        assert!(CatalogError::Timeout(5000).is_unreachable());
    }
}
