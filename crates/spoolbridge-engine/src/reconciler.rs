//! Feeder unit reconciliation.
//!
//! A [`PrinterReconciler`] owns the change-detection baselines of one
//! printer and turns each new [`UnitSnapshot`] into the minimal set of
//! catalog writes. All reconcilers share one [`ReconcileContext`], whose
//! pass lock serializes every read-decide-write sequence across printers.
//!
//! # Pass structure
//!
//! ```text
//! UnitSnapshot ──(equal to baseline?)──► Unchanged
//!      │
//!      ▼  pass lock held from here
//! fetch spools, internal and external filaments (failures read as empty)
//!      │
//!      ▼  for each tray, in order
//! classify ─► match_external ─► match_internal ─► resolve ─► write
//!      │
//!      ▼
//! store snapshot as baseline
//! ```
//!
//! A failed write aborts the unit: later trays are not attempted, earlier
//! writes stand, and the baseline is left as it was so the same snapshot is
//! processed again on its next delivery.

use crate::error::{ReconcileError, ReconcileResult};
use crate::matcher::{match_external, match_internal};
use crate::resolver::{SpoolDecision, resolve};
use chrono::{DateTime, Utc};
use futures::future;
use spoolbridge_catalog::{
    CatalogClient, CatalogResult, ExternalFilament, InternalFilament, NewFilament, NewSpool,
    Spool, SpoolPatch,
};
use spoolbridge_core::{
    AmsUnitId, RawTray, TagField, TrayRejection, TraySnapshot, UnitSnapshot, classify,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// State shared by every printer's reconciler.
pub struct ReconcileContext<C> {
    catalog: Arc<C>,
    pass_lock: Mutex<()>,
    tag: TagField,
    vendor_id: Option<i64>,
}

impl<C: CatalogClient> ReconcileContext<C> {
    /// Create a context.
    ///
    /// `vendor_id` is the vendor new filament types are filed under, as found
    /// by the catalog preflight.
    pub fn new(catalog: Arc<C>, tag: TagField, vendor_id: Option<i64>) -> Self {
        Self {
            catalog,
            pass_lock: Mutex::new(()),
            tag,
            vendor_id,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn tag(&self) -> &TagField {
        &self.tag
    }

    pub fn vendor_id(&self) -> Option<i64> {
        self.vendor_id
    }
}

/// What happened to one tray during a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum TrayAction {
    /// The tray did not pass normalization
    Rejected(TrayRejection),
    /// No external catalog entry matched the tray
    NoExternalMatch,
    CreatedFilamentAndSpool { filament_id: i64, spool_id: i64 },
    CreatedSpool { spool_id: i64 },
    /// An unclaimed spool was selected; `patched` is false when its weight was already current
    Claimed { spool_id: i64, patched: bool },
    /// The tray's own spool was selected
    Refreshed { spool_id: i64, patched: bool },
}

impl TrayAction {
    /// Returns `true` if the action wrote to the catalog.
    #[must_use]
    pub fn wrote(&self) -> bool {
        match self {
            TrayAction::Rejected(_) | TrayAction::NoExternalMatch => false,
            TrayAction::CreatedFilamentAndSpool { .. } | TrayAction::CreatedSpool { .. } => true,
            TrayAction::Claimed { patched, .. } | TrayAction::Refreshed { patched, .. } => *patched,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrayOutcome {
    /// Position label such as `A0`
    pub tray: String,
    pub action: TrayAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    /// The snapshot equals the baseline; nothing was read or written
    Unchanged,
    Processed(Vec<TrayOutcome>),
}

/// Result of one unit within [`PrinterReconciler::process_units`].
#[derive(Debug)]
pub struct UnitResult {
    pub unit: AmsUnitId,
    pub result: ReconcileResult<UnitOutcome>,
}

/// Listings fetched at the start of a pass, updated locally as writes land.
struct Listings {
    spools: Vec<Spool>,
    internal: Vec<InternalFilament>,
    external: Arc<[ExternalFilament]>,
}

/// Per-printer reconciler. Owns the printer's baselines.
pub struct PrinterReconciler<C> {
    printer_id: String,
    context: Arc<ReconcileContext<C>>,
    baselines: HashMap<AmsUnitId, UnitSnapshot>,
}

impl<C: CatalogClient> PrinterReconciler<C> {
    pub fn new(printer_id: impl Into<String>, context: Arc<ReconcileContext<C>>) -> Self {
        Self {
            printer_id: printer_id.into(),
            context,
            baselines: HashMap::new(),
        }
    }

    pub fn printer_id(&self) -> &str {
        &self.printer_id
    }

    /// Last successfully processed snapshot of a unit.
    pub fn baseline(&self, unit: AmsUnitId) -> Option<&UnitSnapshot> {
        self.baselines.get(&unit)
    }

    /// Reconcile every unit of a report.
    ///
    /// A failing unit is logged and does not stop the others.
    pub async fn process_units(
        &mut self,
        units: Vec<UnitSnapshot>,
        now: DateTime<Utc>,
    ) -> Vec<UnitResult> {
        let mut results = Vec::with_capacity(units.len());

        for snapshot in units {
            let unit = snapshot.unit;
            let result = self.process_unit(snapshot, now).await;

            if let Err(e) = &result {
                error!(
                    printer = %self.printer_id,
                    unit = %unit,
                    error = %e,
                    "Feeder unit reconciliation failed"
                );
            }
            results.push(UnitResult { unit, result });
        }

        results
    }

    /// Reconcile one unit.
    ///
    /// # Errors
    ///
    /// Returns the first write failure. The baseline is not updated in that case.
    pub async fn process_unit(
        &mut self,
        snapshot: UnitSnapshot,
        now: DateTime<Utc>,
    ) -> ReconcileResult<UnitOutcome> {
        let unit = snapshot.unit;

        if self.baselines.get(&unit) == Some(&snapshot) {
            info!(printer = %self.printer_id, unit = %unit, "Feeder unit unchanged, skipping");
            return Ok(UnitOutcome::Unchanged);
        }

        let context = Arc::clone(&self.context);
        let _pass = context.pass_lock.lock().await;

        let mut listings = Self::fetch_listings(context.catalog()).await;

        info!(
            printer = %self.printer_id,
            unit = %unit,
            temperature = ?snapshot.temperature,
            humidity = ?snapshot.humidity,
            trays = snapshot.trays.len(),
            "Processing feeder unit"
        );

        let mut outcomes = Vec::with_capacity(snapshot.trays.len());
        for raw in &snapshot.trays {
            let outcome = self.process_tray(unit, raw, &mut listings, now).await?;
            outcomes.push(outcome);
        }

        self.baselines.insert(unit, snapshot);
        Ok(UnitOutcome::Processed(outcomes))
    }

    async fn fetch_listings(catalog: &C) -> Listings {
        let (spools, internal, external) = future::join3(
            catalog.get_spools(),
            catalog.get_internal_filaments(),
            catalog.get_external_filaments(),
        )
        .await;

        let spools = or_empty(spools, "spools");
        let internal = or_empty(internal, "internal filaments");
        let external = external.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch external filaments, treating as empty");
            Arc::from(Vec::new())
        });

        Listings {
            spools,
            internal,
            external,
        }
    }

    async fn process_tray(
        &self,
        unit: AmsUnitId,
        raw: &RawTray,
        listings: &mut Listings,
        now: DateTime<Utc>,
    ) -> ReconcileResult<TrayOutcome> {
        let tray = match classify(unit, raw) {
            Ok(tray) => tray,
            Err(reason) => {
                let label = format!("{unit}{}", raw.id);
                info!(printer = %self.printer_id, tray = %label, %reason, "Tray skipped");
                return Ok(TrayOutcome {
                    tray: label,
                    action: TrayAction::Rejected(reason),
                });
            }
        };
        let label = tray.label();

        info!(
            printer = %self.printer_id,
            tray = %label,
            sub_brand = %tray.sub_brand,
            color = %tray.color,
            remain = tray.remain_percent,
            uuid = %tray.tray_uuid,
            "Processing tray"
        );

        let Some(external) = match_external(&listings.external, &tray).cloned() else {
            info!(printer = %self.printer_id, tray = %label, "No external filament matches tray");
            return Ok(TrayOutcome {
                tray: label,
                action: TrayAction::NoExternalMatch,
            });
        };

        let internal_matches = match_internal(&listings.internal, &external);
        info!(
            printer = %self.printer_id,
            tray = %label,
            external_id = %external.id,
            internal_matches = internal_matches.len(),
            "Filament matched"
        );

        let decision = resolve(
            &listings.spools,
            &internal_matches,
            &tray,
            self.context.tag(),
        );

        let action = match decision {
            SpoolDecision::CreateFilamentAndSpool => {
                let filament = self.create_filament(&external, &tray).await?;
                let spool = self.create_spool(filament.id, &tray, now).await?;
                let action = TrayAction::CreatedFilamentAndSpool {
                    filament_id: filament.id,
                    spool_id: spool.id,
                };
                listings.internal.push(filament);
                listings.spools.push(spool);
                action
            }
            SpoolDecision::CreateSpool(filament) => {
                let filament_id = filament.id;
                let spool = self.create_spool(filament_id, &tray, now).await?;
                let action = TrayAction::CreatedSpool { spool_id: spool.id };
                listings.spools.push(spool);
                action
            }
            SpoolDecision::ClaimUnclaimed(spool) => {
                let spool = spool.clone();
                let patched = self.update_spool(&spool, &tray, now).await?;
                let action = TrayAction::Claimed {
                    spool_id: spool.id,
                    patched: patched.is_some(),
                };
                replace_spool(&mut listings.spools, patched);
                action
            }
            SpoolDecision::RefreshClaimed(spool) => {
                let spool = spool.clone();
                let patched = self.update_spool(&spool, &tray, now).await?;
                let action = TrayAction::Refreshed {
                    spool_id: spool.id,
                    patched: patched.is_some(),
                };
                replace_spool(&mut listings.spools, patched);
                action
            }
        };

        Ok(TrayOutcome {
            tray: label,
            action,
        })
    }

    async fn create_filament(
        &self,
        external: &ExternalFilament,
        tray: &TraySnapshot,
    ) -> ReconcileResult<InternalFilament> {
        let payload = NewFilament::from_external(external, &tray.sub_brand, self.context.vendor_id());

        let filament = self
            .context
            .catalog()
            .create_internal_filament(&payload)
            .await
            .map_err(|source| ReconcileError::CreateFailed {
                entity: "filament",
                tray: tray.label(),
                source,
            })?;

        info!(
            printer = %self.printer_id,
            tray = %tray.label(),
            filament_id = filament.id,
            external_id = %external.id,
            "Filament created"
        );
        Ok(filament)
    }

    async fn create_spool(
        &self,
        filament_id: i64,
        tray: &TraySnapshot,
        now: DateTime<Utc>,
    ) -> ReconcileResult<Spool> {
        let payload = NewSpool {
            filament_id,
            initial_weight: tray.remaining_weight(),
            first_used: now,
            location: self.printer_id.clone(),
            extra: self.tag_extra(tray),
        };

        let spool = self
            .context
            .catalog()
            .create_spool(&payload)
            .await
            .map_err(|source| ReconcileError::CreateFailed {
                entity: "spool",
                tray: tray.label(),
                source,
            })?;

        info!(
            printer = %self.printer_id,
            tray = %tray.label(),
            spool_id = spool.id,
            filament_id,
            initial_weight = payload.initial_weight,
            "Spool created"
        );
        Ok(spool)
    }

    /// Patch a spool with the tray's current reading.
    ///
    /// Returns `None` without writing when the remaining weight is unchanged.
    async fn update_spool(
        &self,
        spool: &Spool,
        tray: &TraySnapshot,
        now: DateTime<Utc>,
    ) -> ReconcileResult<Option<Spool>> {
        let remaining_weight = tray.remaining_weight();

        if spool.remaining_weight == Some(remaining_weight) {
            info!(
                printer = %self.printer_id,
                tray = %tray.label(),
                spool_id = spool.id,
                "Weight unchanged, skipping update"
            );
            return Ok(None);
        }

        let patch = SpoolPatch {
            remaining_weight: Some(remaining_weight),
            first_used: (!spool.has_first_used()).then_some(now),
            last_used: Some(now),
            location: Some(self.printer_id.clone()),
            extra: Some(self.tag_extra(tray)),
        };

        let updated = self
            .context
            .catalog()
            .patch_spool(spool.id, &patch)
            .await
            .map_err(|source| ReconcileError::UpdateFailed {
                spool_id: spool.id,
                tray: tray.label(),
                source,
            })?;

        info!(
            printer = %self.printer_id,
            tray = %tray.label(),
            spool_id = spool.id,
            remaining_weight,
            "Spool updated"
        );
        Ok(Some(updated))
    }

    fn tag_extra(&self, tray: &TraySnapshot) -> BTreeMap<String, String> {
        let tag = self.context.tag();
        BTreeMap::from([(tag.key().to_string(), tag.encode(&tray.tray_uuid))])
    }
}

fn or_empty<T>(result: CatalogResult<Vec<T>>, listing: &'static str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(listing, error = %e, "Catalog read failed, treating as empty");
        Vec::new()
    })
}

fn replace_spool(spools: &mut [Spool], updated: Option<Spool>) {
    if let Some(updated) = updated
        && let Some(slot) = spools.iter_mut().find(|s| s.id == updated.id)
    {
        *slot = updated;
    }
}
