//! Spool resolution.
//!
//! Decides which inventory spool, if any, a matched tray corresponds to.
//! Only spools of the first matching internal filament type are considered.
//! Among those, a spool already claimed by this tray beats an unclaimed one,
//! and spools claimed by another tray are never touched.

use spoolbridge_catalog::{ClaimState, InternalFilament, Spool};
use spoolbridge_core::{TagField, TraySnapshot};
use tracing::debug;

/// What to do for a tray whose filament type was identified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpoolDecision<'a> {
    /// No internal filament type exists yet
    CreateFilamentAndSpool,
    /// The filament type exists but no usable spool does
    CreateSpool(&'a InternalFilament),
    /// Take over a spool nobody has claimed
    ClaimUnclaimed(&'a Spool),
    /// Update the spool this tray already claims
    RefreshClaimed(&'a Spool),
}

/// Resolve a tray to a spool decision.
///
/// Every spool is scanned; when several qualify, the last one in listing
/// order is chosen.
#[must_use]
pub fn resolve<'a>(
    spools: &'a [Spool],
    internal_matches: &[&'a InternalFilament],
    tray: &TraySnapshot,
    tag: &TagField,
) -> SpoolDecision<'a> {
    // Several internal types can share one external id; only the first counts.
    let Some(&filament) = internal_matches.first() else {
        return SpoolDecision::CreateFilamentAndSpool;
    };
    let external_id = filament.external_id.as_deref();

    let mut unclaimed = None;
    let mut claimed = None;

    for spool in spools
        .iter()
        .filter(|spool| spool.filament_external_id() == external_id)
    {
        match spool.claim_state(tag) {
            ClaimState::Unclaimed => unclaimed = Some(spool),
            state if state.is_claimed_by(&tray.tray_uuid) => claimed = Some(spool),
            ClaimState::Claimed(uuid) => {
                debug!(spool_id = spool.id, claimed_by = %uuid, "Spool claimed by another tray");
            }
        }
    }

    match (claimed, unclaimed) {
        (Some(spool), _) => SpoolDecision::RefreshClaimed(spool),
        (None, Some(spool)) => SpoolDecision::ClaimUnclaimed(spool),
        (None, None) => SpoolDecision::CreateSpool(filament),
    }
}
