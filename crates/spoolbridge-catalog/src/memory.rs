//! In-memory catalog.
//!
//! [`InMemoryCatalog`] implements [`CatalogClient`] without a service behind
//! it: ids are assigned sequentially, every successful write is appended to
//! a log, and failures can be injected per operation kind. Clones share
//! state, so a test can keep one handle while the engine owns another.
//!
//! Calls complete without suspending unless [`InMemoryCatalog::yield_on_reads`]
//! is enabled, in which case every listing yields to the runtime once after
//! taking its snapshot, the way a network round-trip would.

use crate::client::CatalogClient;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    EntityType, ExternalFilament, FieldDef, InternalFilament, NewField, NewFilament, NewSpool,
    NewVendor, Spool, SpoolPatch, Vendor,
};
use spoolbridge_core::constants::EXTERNAL_ID_PREFIX;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A successful write, as recorded by [`InMemoryCatalog`].
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogWrite {
    CreateVendor(NewVendor),
    CreateField { entity: EntityType, key: String },
    CreateFilament(NewFilament),
    CreateSpool(NewSpool),
    PatchSpool { id: i64, patch: SpoolPatch },
}

/// Operation kinds that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    /// Every listing
    Reads,
    VendorCreates,
    FieldCreates,
    FilamentCreates,
    SpoolCreates,
    SpoolPatches,
    Health,
}

#[derive(Debug, Default)]
struct State {
    vendors: Vec<Vendor>,
    fields: BTreeMap<EntityType, Vec<FieldDef>>,
    spools: Vec<Spool>,
    filaments: Vec<InternalFilament>,
    external: Vec<ExternalFilament>,
    next_id: i64,
    writes: Vec<CatalogWrite>,
    requests: usize,
    failing: Vec<Failure>,
    yield_on_reads: bool,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&mut self, kind: Failure, operation: &'static str) -> CatalogResult<()> {
        self.requests += 1;
        if self.failing.contains(&kind) {
            return Err(CatalogError::Status {
                method: operation,
                url: "memory://catalog".to_string(),
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<Mutex<State>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed the external catalog. Entries outside the bridge prefix are
    /// stored but never listed.
    pub fn with_external(self, filaments: impl IntoIterator<Item = ExternalFilament>) -> Self {
        self.lock().external.extend(filaments);
        self
    }

    /// Seed an internal filament type, keeping its id.
    pub fn with_filament(self, filament: InternalFilament) -> Self {
        {
            let mut state = self.lock();
            state.next_id = state.next_id.max(filament.id);
            state.filaments.push(filament);
        }
        self
    }

    /// Seed a spool, keeping its id.
    pub fn with_spool(self, spool: Spool) -> Self {
        {
            let mut state = self.lock();
            state.next_id = state.next_id.max(spool.id);
            state.spools.push(spool);
        }
        self
    }

    /// Seed a vendor, keeping its id.
    pub fn with_vendor(self, vendor: Vendor) -> Self {
        {
            let mut state = self.lock();
            state.next_id = state.next_id.max(vendor.id);
            state.vendors.push(vendor);
        }
        self
    }

    /// Make every subsequent operation of `kind` fail until cleared.
    pub fn fail(&self, kind: Failure) {
        let mut state = self.lock();
        if !state.failing.contains(&kind) {
            state.failing.push(kind);
        }
    }

    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    /// Make every listing suspend once before returning its snapshot.
    pub fn yield_on_reads(&self, enabled: bool) {
        self.lock().yield_on_reads = enabled;
    }

    async fn read<T>(&self, snapshot: impl FnOnce(&State) -> T) -> CatalogResult<T> {
        let (result, pause) = {
            let mut state = self.lock();
            let result = state.check(Failure::Reads, "GET").map(|()| snapshot(&*state));
            (result, state.yield_on_reads)
        };
        if pause {
            tokio::task::yield_now().await;
        }
        result
    }

    /// Successful writes, oldest first.
    pub fn writes(&self) -> Vec<CatalogWrite> {
        self.lock().writes.clone()
    }

    /// Number of calls made, including failed ones.
    pub fn request_count(&self) -> usize {
        self.lock().requests
    }

    pub fn spools(&self) -> Vec<Spool> {
        self.lock().spools.clone()
    }

    pub fn filaments(&self) -> Vec<InternalFilament> {
        self.lock().filaments.clone()
    }

    pub fn vendors(&self) -> Vec<Vendor> {
        self.lock().vendors.clone()
    }
}

impl CatalogClient for InMemoryCatalog {
    async fn health(&self) -> CatalogResult<()> {
        self.lock().check(Failure::Health, "GET")
    }

    async fn get_vendors(&self) -> CatalogResult<Vec<Vendor>> {
        self.read(|state| state.vendors.clone()).await
    }

    async fn create_vendor(&self, vendor: &NewVendor) -> CatalogResult<Vendor> {
        let mut state = self.lock();
        state.check(Failure::VendorCreates, "POST")?;

        let created = Vendor {
            id: state.next_id(),
            name: vendor.name.clone(),
            external_id: vendor.external_id.clone(),
            empty_spool_weight: vendor.empty_spool_weight,
        };
        state.vendors.push(created.clone());
        state.writes.push(CatalogWrite::CreateVendor(vendor.clone()));
        Ok(created)
    }

    async fn get_fields(&self, entity: EntityType) -> CatalogResult<Vec<FieldDef>> {
        self.read(|state| state.fields.get(&entity).cloned().unwrap_or_default())
            .await
    }

    async fn create_field(
        &self,
        entity: EntityType,
        key: &str,
        field: &NewField,
    ) -> CatalogResult<Vec<FieldDef>> {
        let mut state = self.lock();
        state.check(Failure::FieldCreates, "POST")?;

        let fields = state.fields.entry(entity).or_default();
        fields.retain(|f| f.key != key);
        fields.push(FieldDef {
            key: key.to_string(),
            name: field.name.clone(),
            field_type: field.field_type,
            entity_type: Some(entity),
        });
        let listing = fields.clone();

        state.writes.push(CatalogWrite::CreateField {
            entity,
            key: key.to_string(),
        });
        Ok(listing)
    }

    async fn get_spools(&self) -> CatalogResult<Vec<Spool>> {
        self.read(|state| state.spools.clone()).await
    }

    async fn create_spool(&self, spool: &NewSpool) -> CatalogResult<Spool> {
        let mut state = self.lock();
        state.check(Failure::SpoolCreates, "POST")?;

        let filament = state
            .filaments
            .iter()
            .find(|f| f.id == spool.filament_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                entity: "filament",
                id: spool.filament_id.to_string(),
            })?;

        let created = Spool {
            id: state.next_id(),
            filament,
            remaining_weight: Some(spool.initial_weight),
            initial_weight: Some(spool.initial_weight),
            first_used: Some(spool.first_used.to_rfc3339()),
            last_used: None,
            location: Some(spool.location.clone()),
            archived: false,
            extra: spool.extra.clone(),
        };
        state.spools.push(created.clone());
        state.writes.push(CatalogWrite::CreateSpool(spool.clone()));
        Ok(created)
    }

    async fn patch_spool(&self, id: i64, patch: &SpoolPatch) -> CatalogResult<Spool> {
        let mut state = self.lock();
        state.check(Failure::SpoolPatches, "PATCH")?;

        let spool = state
            .spools
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CatalogError::NotFound {
                entity: "spool",
                id: id.to_string(),
            })?;

        if let Some(weight) = patch.remaining_weight {
            spool.remaining_weight = Some(weight);
        }
        if let Some(first_used) = patch.first_used {
            spool.first_used = Some(first_used.to_rfc3339());
        }
        if let Some(last_used) = patch.last_used {
            spool.last_used = Some(last_used.to_rfc3339());
        }
        if let Some(location) = &patch.location {
            spool.location = Some(location.clone());
        }
        if let Some(extra) = &patch.extra {
            spool.extra.extend(extra.clone());
        }
        let updated = spool.clone();

        state.writes.push(CatalogWrite::PatchSpool {
            id,
            patch: patch.clone(),
        });
        Ok(updated)
    }

    async fn get_internal_filaments(&self) -> CatalogResult<Vec<InternalFilament>> {
        self.read(|state| state.filaments.clone()).await
    }

    async fn create_internal_filament(
        &self,
        filament: &NewFilament,
    ) -> CatalogResult<InternalFilament> {
        let mut state = self.lock();
        state.check(Failure::FilamentCreates, "POST")?;

        let vendor = filament
            .vendor_id
            .and_then(|id| state.vendors.iter().find(|v| v.id == id).cloned());
        let created = InternalFilament {
            id: state.next_id(),
            name: Some(filament.name.clone()),
            vendor,
            material: Some(filament.material.clone()),
            density: filament.density,
            diameter: filament.diameter,
            weight: Some(filament.weight),
            spool_weight: Some(filament.spool_weight),
            settings_extruder_temp: filament.settings_extruder_temp,
            settings_bed_temp: filament.settings_bed_temp,
            color_hex: filament.color_hex.clone(),
            external_id: Some(filament.external_id.clone()),
        };
        state.filaments.push(created.clone());
        state
            .writes
            .push(CatalogWrite::CreateFilament(filament.clone()));
        Ok(created)
    }

    async fn get_external_filaments(&self) -> CatalogResult<Arc<[ExternalFilament]>> {
        self.read(|state| {
            state
                .external
                .iter()
                .filter(|f| f.id.starts_with(EXTERNAL_ID_PREFIX))
                .cloned()
                .collect()
        })
        .await
    }
}
