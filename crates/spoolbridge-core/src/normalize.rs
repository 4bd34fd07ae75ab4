//! Tray normalization.
//!
//! Turns a [`RawTray`] from a printer report into a [`TraySnapshot`], or
//! explains why the slot is not reconcilable. Checks run in a fixed order:
//! empty slot, remaining amount, tray UUID, then color. Translucent PETG
//! reports an all-zero color, so its color is substituted before the color
//! check instead of the tray being discarded.

use crate::{
    constants::{EMPTY_TRAY_COLOR, EMPTY_TRAY_UUID, TRANSLUCENT_PETG_COLOR, TRANSLUCENT_PETG_LABEL},
    types::{AmsUnitId, RawTray, TrayColor, TraySnapshot},
};
use thiserror::Error;

/// Why a tray was not turned into a [`TraySnapshot`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrayRejection {
    #[error("slot is empty")]
    EmptySlot,

    #[error("no filament remaining ({0}%)")]
    NoFilamentRemaining(f64),

    #[error("tray has no RFID tag")]
    UntaggedTray,

    #[error("tray reports no color")]
    NoColor,

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Validate a raw tray and normalize it.
///
/// # Errors
///
/// Returns the first [`TrayRejection`] that applies, in check order.
pub fn classify(unit: AmsUnitId, raw: &RawTray) -> Result<TraySnapshot, TrayRejection> {
    if raw.is_empty_slot() {
        return Err(TrayRejection::EmptySlot);
    }

    let remain = raw
        .remain
        .as_ref()
        .ok_or(TrayRejection::MissingField("remain"))?;
    let remain_percent = remain
        .as_f64()
        .filter(|r| r.is_finite())
        .ok_or_else(|| TrayRejection::InvalidField {
            field: "remain",
            value: remain.to_string(),
        })?;
    if remain_percent <= 0.0 {
        return Err(TrayRejection::NoFilamentRemaining(remain_percent));
    }

    let tray_uuid = raw
        .tray_uuid
        .as_deref()
        .ok_or(TrayRejection::MissingField("tray_uuid"))?;
    if tray_uuid.is_empty() || tray_uuid == EMPTY_TRAY_UUID {
        return Err(TrayRejection::UntaggedTray);
    }

    let sub_brand = raw
        .tray_sub_brands
        .as_deref()
        .ok_or(TrayRejection::MissingField("tray_sub_brands"))?;

    let reported_color = raw
        .tray_color
        .as_deref()
        .ok_or(TrayRejection::MissingField("tray_color"))?;
    let color_hex = if reported_color == EMPTY_TRAY_COLOR && sub_brand == TRANSLUCENT_PETG_LABEL {
        TRANSLUCENT_PETG_COLOR
    } else {
        reported_color
    };
    if color_hex == EMPTY_TRAY_COLOR {
        return Err(TrayRejection::NoColor);
    }
    let color = TrayColor::new(color_hex).map_err(|_| TrayRejection::InvalidField {
        field: "tray_color",
        value: color_hex.to_string(),
    })?;

    let weight = raw
        .tray_weight
        .as_ref()
        .ok_or(TrayRejection::MissingField("tray_weight"))?;
    let tray_weight = weight
        .as_f64()
        .filter(|w| w.is_finite() && *w >= 0.0)
        .ok_or_else(|| TrayRejection::InvalidField {
            field: "tray_weight",
            value: weight.to_string(),
        })?;

    Ok(TraySnapshot {
        unit,
        slot: raw.id.to_string(),
        remain_percent,
        tray_weight,
        tray_uuid: tray_uuid.to_string(),
        color,
        sub_brand: sub_brand.to_string(),
    })
}

/// Normalize a raw tray, discarding the rejection reason.
///
/// Returns `None` for every tray that must not be reconciled.
#[must_use]
pub fn normalize(unit: AmsUnitId, raw: &RawTray) -> Option<TraySnapshot> {
    classify(unit, raw).ok()
}
