//! HTTP client for the Spoolman inventory service.
//!
//! [`SpoolmanClient`] implements [`CatalogClient`] over the service's REST
//! API (`<base>/api/v1`). Every exchange, including reading the response
//! body, runs under a single timeout; non-success statuses become
//! [`CatalogError::Status`] with the response body attached.
//!
//! # Example
//!
//! ```no_run
//! use spoolbridge_catalog::{CatalogClient, SpoolmanClient, SpoolmanConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SpoolmanClient::new(SpoolmanConfig {
//!     base_url: "http://192.168.1.20:7912".to_string(),
//!     timeout: Duration::from_secs(5),
//! })?;
//!
//! client.health().await?;
//! let spools = client.get_spools().await?;
//! println!("{} spools", spools.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Caching
//!
//! The external filament catalog is fetched on first use and kept for the
//! lifetime of the client. A failed fetch is not cached, so the next call
//! retries. Catalog updates published after the first fetch are not seen
//! until restart.

use crate::client::CatalogClient;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    EntityType, ExternalFilament, FieldDef, InternalFilament, NewField, NewFilament, NewSpool,
    NewVendor, Spool, SpoolPatch, Vendor,
};
use chrono::{DateTime, Utc};
use reqwest::RequestBuilder;
use serde::{Serialize, de::DeserializeOwned};
use spoolbridge_core::constants::{DEFAULT_CATALOG_TIMEOUT_SECS, EXTERNAL_ID_PREFIX};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Configuration for [`SpoolmanClient`]
#[derive(Debug, Clone)]
pub struct SpoolmanConfig {
    /// Service root, e.g. `http://192.168.1.20:7912`
    pub base_url: String,

    /// Timeout for each request, including the response body
    pub timeout: Duration,
}

impl Default for SpoolmanConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7912".to_string(),
            timeout: Duration::from_secs(DEFAULT_CATALOG_TIMEOUT_SECS),
        }
    }
}

/// Result of the most recent health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CatalogStatus {
    pub connected: bool,
    pub last_check: Option<DateTime<Utc>>,
}

pub struct SpoolmanClient {
    http: reqwest::Client,
    api_url: String,
    timeout: Duration,
    status: RwLock<CatalogStatus>,
    external: OnceCell<Arc<[ExternalFilament]>>,
}

impl SpoolmanClient {
    /// Create a client for the given service root.
    ///
    /// No request is made until the first call.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client cannot be built.
    pub fn new(config: SpoolmanConfig) -> CatalogResult<Self> {
        let http = reqwest::Client::builder().build()?;
        let api_url = format!("{}/api/v1", config.base_url.trim_end_matches('/'));

        info!(url = %api_url, timeout_ms = config.timeout.as_millis() as u64, "Spoolman client configured");

        Ok(Self {
            http,
            api_url,
            timeout: config.timeout,
            status: RwLock::new(CatalogStatus::default()),
            external: OnceCell::new(),
        })
    }

    /// API root all endpoints are resolved against.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Outcome of the last health check.
    pub fn status(&self) -> CatalogStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> CatalogResult<T> {
        let url = self.url(path);
        let request = self.http.get(&url);
        self.execute("GET", request, url).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> CatalogResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self.http.post(&url).json(body);
        self.execute("POST", request, url).await
    }

    async fn patch<B, T>(&self, path: &str, body: &B) -> CatalogResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self.http.patch(&url).json(body);
        self.execute("PATCH", request, url).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &'static str,
        request: RequestBuilder,
        url: String,
    ) -> CatalogResult<T> {
        debug!(method, url = %url, "Catalog request");

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CatalogError::Status {
                    method,
                    url: url.clone(),
                    status: status.as_u16(),
                    body,
                });
            }

            let bytes = response.bytes().await?;
            serde_json::from_slice::<T>(&bytes)
                .map_err(|e| CatalogError::Decode(format!("{method} {url}: {e}")))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(method, url = %url, timeout_ms, "Catalog request timed out");
                Err(CatalogError::Timeout(timeout_ms))
            }
        }
    }

    fn record_health(&self, connected: bool) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        status.connected = connected;
        status.last_check = Some(Utc::now());
    }
}

impl CatalogClient for SpoolmanClient {
    async fn health(&self) -> CatalogResult<()> {
        let result = self.get::<serde_json::Value>("health").await;
        self.record_health(result.is_ok());

        match result {
            Ok(_) => {
                info!(url = %self.api_url, "Spoolman healthy");
                Ok(())
            }
            Err(e) => {
                warn!(url = %self.api_url, error = %e, "Spoolman unhealthy");
                Err(e)
            }
        }
    }

    async fn get_vendors(&self) -> CatalogResult<Vec<Vendor>> {
        self.get("vendor").await
    }

    async fn create_vendor(&self, vendor: &NewVendor) -> CatalogResult<Vendor> {
        self.post("vendor", vendor).await
    }

    async fn get_fields(&self, entity: EntityType) -> CatalogResult<Vec<FieldDef>> {
        self.get(&format!("field/{entity}")).await
    }

    async fn create_field(
        &self,
        entity: EntityType,
        key: &str,
        field: &NewField,
    ) -> CatalogResult<Vec<FieldDef>> {
        self.post(&format!("field/{entity}/{key}"), field).await
    }

    async fn get_spools(&self) -> CatalogResult<Vec<Spool>> {
        self.get("spool").await
    }

    async fn create_spool(&self, spool: &NewSpool) -> CatalogResult<Spool> {
        self.post("spool", spool).await
    }

    async fn patch_spool(&self, id: i64, patch: &SpoolPatch) -> CatalogResult<Spool> {
        self.patch(&format!("spool/{id}"), patch).await
    }

    async fn get_internal_filaments(&self) -> CatalogResult<Vec<InternalFilament>> {
        self.get("filament").await
    }

    async fn create_internal_filament(
        &self,
        filament: &NewFilament,
    ) -> CatalogResult<InternalFilament> {
        self.post("filament", filament).await
    }

    async fn get_external_filaments(&self) -> CatalogResult<Arc<[ExternalFilament]>> {
        let cached = self
            .external
            .get_or_try_init(|| async {
                let all: Vec<ExternalFilament> = self.get("external/filament").await?;
                let total = all.len();
                let filtered: Arc<[ExternalFilament]> = all
                    .into_iter()
                    .filter(|f| f.id.starts_with(EXTERNAL_ID_PREFIX))
                    .collect();

                info!(
                    total,
                    cached = filtered.len(),
                    prefix = EXTERNAL_ID_PREFIX,
                    "External filament catalog cached"
                );
                Ok::<_, CatalogError>(filtered)
            })
            .await?;

        Ok(Arc::clone(cached))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let client = SpoolmanClient::new(SpoolmanConfig {
            base_url: "http://spoolman.local:7912/".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        assert_eq!(client.api_url(), "http://spoolman.local:7912/api/v1");
        assert_eq!(client.url("spool/3"), "http://spoolman.local:7912/api/v1/spool/3");
    }

    #[test]
    fn test_status_before_first_check() {
        let client = SpoolmanClient::new(SpoolmanConfig::default()).unwrap();
        let status = client.status();
        assert!(!status.connected);
        assert!(status.last_check.is_none());
    }
}
