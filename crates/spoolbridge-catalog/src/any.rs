use crate::client::CatalogClient;
use crate::error::CatalogResult;
use crate::memory::InMemoryCatalog;
use crate::models::{
    EntityType, ExternalFilament, FieldDef, InternalFilament, NewField, NewFilament, NewSpool,
    NewVendor, Spool, SpoolPatch, Vendor,
};
use crate::spoolman::{CatalogStatus, SpoolmanClient};
use std::sync::Arc;

/// Enum wrapper for catalog dispatch.
///
/// Native async trait methods are not object-safe, and their futures only
/// prove `Send` for concrete types. Spawned printer workers therefore hold
/// this enum rather than a generic catalog parameter.
///
/// # Examples
///
/// ```
/// use spoolbridge_catalog::{AnyCatalog, CatalogClient, InMemoryCatalog};
///
/// #[tokio::main]
/// async fn main() -> spoolbridge_catalog::CatalogResult<()> {
///     let catalog = AnyCatalog::from(InMemoryCatalog::new());
///     catalog.health().await?;
///     assert!(catalog.get_spools().await?.is_empty());
///     Ok(())
/// }
/// ```
pub enum AnyCatalog {
    /// Live Spoolman service over HTTP.
    Spoolman(SpoolmanClient),
    /// In-memory catalog for tests and dry runs.
    InMemory(InMemoryCatalog),
}

impl AnyCatalog {
    /// Outcome of the last health check of a live service.
    ///
    /// The in-memory catalog has no connection to report.
    pub fn status(&self) -> Option<CatalogStatus> {
        match self {
            Self::Spoolman(client) => Some(client.status()),
            Self::InMemory(_) => None,
        }
    }
}

impl From<SpoolmanClient> for AnyCatalog {
    fn from(client: SpoolmanClient) -> Self {
        AnyCatalog::Spoolman(client)
    }
}

impl From<InMemoryCatalog> for AnyCatalog {
    fn from(catalog: InMemoryCatalog) -> Self {
        AnyCatalog::InMemory(catalog)
    }
}

impl CatalogClient for AnyCatalog {
    async fn health(&self) -> CatalogResult<()> {
        match self {
            Self::Spoolman(client) => client.health().await,
            Self::InMemory(catalog) => catalog.health().await,
        }
    }

    async fn get_vendors(&self) -> CatalogResult<Vec<Vendor>> {
        match self {
            Self::Spoolman(client) => client.get_vendors().await,
            Self::InMemory(catalog) => catalog.get_vendors().await,
        }
    }

    async fn create_vendor(&self, vendor: &NewVendor) -> CatalogResult<Vendor> {
        match self {
            Self::Spoolman(client) => client.create_vendor(vendor).await,
            Self::InMemory(catalog) => catalog.create_vendor(vendor).await,
        }
    }

    async fn get_fields(&self, entity: EntityType) -> CatalogResult<Vec<FieldDef>> {
        match self {
            Self::Spoolman(client) => client.get_fields(entity).await,
            Self::InMemory(catalog) => catalog.get_fields(entity).await,
        }
    }

    async fn create_field(
        &self,
        entity: EntityType,
        key: &str,
        field: &NewField,
    ) -> CatalogResult<Vec<FieldDef>> {
        match self {
            Self::Spoolman(client) => client.create_field(entity, key, field).await,
            Self::InMemory(catalog) => catalog.create_field(entity, key, field).await,
        }
    }

    async fn get_spools(&self) -> CatalogResult<Vec<Spool>> {
        match self {
            Self::Spoolman(client) => client.get_spools().await,
            Self::InMemory(catalog) => catalog.get_spools().await,
        }
    }

    async fn create_spool(&self, spool: &NewSpool) -> CatalogResult<Spool> {
        match self {
            Self::Spoolman(client) => client.create_spool(spool).await,
            Self::InMemory(catalog) => catalog.create_spool(spool).await,
        }
    }

    async fn patch_spool(&self, id: i64, patch: &SpoolPatch) -> CatalogResult<Spool> {
        match self {
            Self::Spoolman(client) => client.patch_spool(id, patch).await,
            Self::InMemory(catalog) => catalog.patch_spool(id, patch).await,
        }
    }

    async fn get_internal_filaments(&self) -> CatalogResult<Vec<InternalFilament>> {
        match self {
            Self::Spoolman(client) => client.get_internal_filaments().await,
            Self::InMemory(catalog) => catalog.get_internal_filaments().await,
        }
    }

    async fn create_internal_filament(
        &self,
        filament: &NewFilament,
    ) -> CatalogResult<InternalFilament> {
        match self {
            Self::Spoolman(client) => client.create_internal_filament(filament).await,
            Self::InMemory(catalog) => catalog.create_internal_filament(filament).await,
        }
    }

    async fn get_external_filaments(&self) -> CatalogResult<Arc<[ExternalFilament]>> {
        match self {
            Self::Spoolman(client) => client.get_external_filaments().await,
            Self::InMemory(catalog) => catalog.get_external_filaments().await,
        }
    }
}
