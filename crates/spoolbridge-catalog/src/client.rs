#![allow(async_fn_in_trait)]

use crate::error::CatalogResult;
use crate::models::{
    EntityType, ExternalFilament, FieldDef, InternalFilament, NewField, NewFilament, NewSpool,
    NewVendor, Spool, SpoolPatch, Vendor,
};
use std::sync::Arc;

/// Contract for reading and writing the inventory service.
///
/// The reconciliation engine depends only on this trait, so it can run
/// against the real service or an in-memory catalog.
///
/// # Implementation Note
///
/// This trait uses native async trait methods (Edition 2024). Callers that
/// need to spawn the resulting futures go through [`crate::AnyCatalog`],
/// whose concrete futures carry their `Send` bound.
pub trait CatalogClient: Send + Sync {
    /// Check that the service is reachable and healthy.
    async fn health(&self) -> CatalogResult<()>;

    async fn get_vendors(&self) -> CatalogResult<Vec<Vendor>>;

    async fn create_vendor(&self, vendor: &NewVendor) -> CatalogResult<Vendor>;

    /// List extra field definitions for an entity kind.
    async fn get_fields(&self, entity: EntityType) -> CatalogResult<Vec<FieldDef>>;

    /// Register an extra field under `key`. Returns the entity's full field list.
    async fn create_field(
        &self,
        entity: EntityType,
        key: &str,
        field: &NewField,
    ) -> CatalogResult<Vec<FieldDef>>;

    async fn get_spools(&self) -> CatalogResult<Vec<Spool>>;

    async fn create_spool(&self, spool: &NewSpool) -> CatalogResult<Spool>;

    async fn patch_spool(&self, id: i64, patch: &SpoolPatch) -> CatalogResult<Spool>;

    async fn get_internal_filaments(&self) -> CatalogResult<Vec<InternalFilament>>;

    async fn create_internal_filament(&self, filament: &NewFilament)
    -> CatalogResult<InternalFilament>;

    /// Vendor-published filament types, restricted to the bridge's id prefix.
    ///
    /// Implementations may cache the listing for the life of the client.
    async fn get_external_filaments(&self) -> CatalogResult<Arc<[ExternalFilament]>>;
}
