use super::InternalFilament;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spoolbridge_core::TagField;
use std::collections::BTreeMap;

/// One physical spool tracked by the inventory service.
///
/// `extra` values are JSON documents stored as strings, so a claimed tag
/// reads `"\"<uuid>\""`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spool {
    pub id: i64,
    pub filament: InternalFilament,
    #[serde(default)]
    pub remaining_weight: Option<f64>,
    #[serde(default)]
    pub initial_weight: Option<f64>,
    #[serde(default)]
    pub first_used: Option<String>,
    #[serde(default)]
    pub last_used: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// Who, if anyone, has claimed a spool through the tag field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimState {
    Unclaimed,
    Claimed(String),
}

impl ClaimState {
    /// Returns `true` if claimed by the given tray UUID.
    #[must_use]
    pub fn is_claimed_by(&self, tray_uuid: &str) -> bool {
        matches!(self, ClaimState::Claimed(uuid) if uuid == tray_uuid)
    }
}

impl Spool {
    /// External id of the spool's filament type, if it was created from the catalog.
    #[must_use]
    pub fn filament_external_id(&self) -> Option<&str> {
        self.filament.external_id.as_deref()
    }

    /// Read the claim recorded in the tag extra field.
    ///
    /// An absent key, a bare empty value, and an encoded empty string all
    /// mean the spool is free. Values that are not JSON strings are taken
    /// verbatim.
    #[must_use]
    pub fn claim_state(&self, tag: &TagField) -> ClaimState {
        let Some(raw) = self.extra.get(tag.key()) else {
            return ClaimState::Unclaimed;
        };

        let value = serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.clone());
        if value.is_empty() {
            ClaimState::Unclaimed
        } else {
            ClaimState::Claimed(value)
        }
    }

    /// Returns `true` if a first-use time is recorded.
    #[must_use]
    pub fn has_first_used(&self) -> bool {
        self.first_used.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Payload for registering a spool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSpool {
    pub filament_id: i64,
    pub initial_weight: f64,
    pub first_used: DateTime<Utc>,
    pub location: String,
    pub extra: BTreeMap<String, String>,
}

/// Partial spool update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpoolPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_used: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const UUID: &str = "A1B2C3D4E5F60718293A4B5C6D7E8F90";

    fn spool_with_extra(extra: serde_json::Value) -> Spool {
        serde_json::from_value(json!({
            "id": 7,
            "filament": {"id": 2, "density": 1.24, "diameter": 1.75, "external_id": "bambulab_pla_basic_orange"},
            "remaining_weight": 640.0,
            "extra": extra
        }))
        .unwrap()
    }

    #[rstest]
    #[case(json!({}), ClaimState::Unclaimed)]
    #[case(json!({"tag": "\"\""}), ClaimState::Unclaimed)]
    #[case(json!({"tag": ""}), ClaimState::Unclaimed)]
    #[case(json!({"tag": format!("\"{UUID}\"")}), ClaimState::Claimed(UUID.to_string()))]
    #[case(json!({"tag": "\"OTHER\""}), ClaimState::Claimed("OTHER".to_string()))]
    #[case(json!({"tag": "bare"}), ClaimState::Claimed("bare".to_string()))]
    #[case(json!({"Tag": "\"OTHER\""}), ClaimState::Unclaimed)]
    fn test_claim_state(#[case] extra: serde_json::Value, #[case] expected: ClaimState) {
        let spool = spool_with_extra(extra);
        assert_eq!(spool.claim_state(&TagField::default()), expected);
    }

    #[test]
    fn test_is_claimed_by() {
        let state = ClaimState::Claimed(UUID.to_string());
        assert!(state.is_claimed_by(UUID));
        assert!(!state.is_claimed_by("OTHER"));
        assert!(!ClaimState::Unclaimed.is_claimed_by(UUID));
    }

    #[test]
    fn test_spool_defaults_and_helpers() {
        let spool = spool_with_extra(json!({}));
        assert_eq!(spool.filament_external_id(), Some("bambulab_pla_basic_orange"));
        assert!(!spool.has_first_used());
        assert!(!spool.archived);
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = SpoolPatch {
            remaining_weight: Some(420.0),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"remaining_weight": 420.0})
        );
    }
}
