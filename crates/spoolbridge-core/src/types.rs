use crate::{
    Result,
    constants::{DEFAULT_TAG_FIELD, MAX_AMS_UNITS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Feeder (AMS) unit identifier.
///
/// Printers report units by numeric index; the bridge names them by letter
/// the same way the printer's own display does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AmsUnitId {
    A,
    B,
    C,
    D,
}

impl AmsUnitId {
    /// Create a unit id from the numeric index reported by the printer.
    ///
    /// # Errors
    /// Returns `Error::InvalidUnitId` for any index outside 0-3.
    pub fn from_index(index: u8) -> Result<Self> {
        match index {
            0 => Ok(AmsUnitId::A),
            1 => Ok(AmsUnitId::B),
            2 => Ok(AmsUnitId::C),
            3 => Ok(AmsUnitId::D),
            _ => Err(Error::InvalidUnitId(format!(
                "{index} (expected 0-{})",
                MAX_AMS_UNITS - 1
            ))),
        }
    }

    /// Numeric index of the unit.
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Letter of the unit.
    #[must_use]
    pub fn letter(self) -> char {
        (b'A' + self.index()) as char
    }
}

impl fmt::Display for AmsUnitId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl std::str::FromStr for AmsUnitId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let index: u8 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidUnitId(s.to_string()))?;
        AmsUnitId::from_index(index)
    }
}

impl TryFrom<&Reading> for AmsUnitId {
    type Error = Error;

    fn try_from(reading: &Reading) -> Result<Self> {
        match reading {
            Reading::Text(text) => text.parse(),
            Reading::Number(n) if n.fract() == 0.0 && (0.0..=255.0).contains(n) => {
                AmsUnitId::from_index(*n as u8)
            }
            Reading::Number(n) => Err(Error::InvalidUnitId(n.to_string())),
        }
    }
}

/// Map a numeric feeder index to its letter.
///
/// # Errors
/// Returns `Error::InvalidUnitId` for any index outside 0-3.
pub fn feeder_unit_letter(index: u8) -> Result<char> {
    AmsUnitId::from_index(index).map(AmsUnitId::letter)
}

/// A scalar from a printer report.
///
/// The firmware is inconsistent about quoting: the same field can arrive as
/// `"1000"` on one model and `1000` on another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl Reading {
    /// Numeric value of the reading, parsing text when needed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Number(n) => Some(*n),
            Reading::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Text value of the reading. Numbers are not converted.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reading::Text(text) => Some(text),
            Reading::Number(_) => None,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Reading::Number(n) => write!(f, "{n}"),
            Reading::Text(text) => write!(f, "{text}"),
        }
    }
}

/// One tray slot exactly as decoded from a printer report.
///
/// Every field except the slot id is optional: empty slots carry the id
/// alone. Fields the bridge does not use are kept in `other` so that two
/// snapshots compare equal only when the whole report content is equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTray {
    pub id: Reading,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remain: Option<Reading>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tray_uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tray_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tray_sub_brands: Option<String>,

    /// Gross filament weight of a full spool, in grams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tray_weight: Option<Reading>,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl RawTray {
    /// Create a raw tray carrying only the slot id, as reported for empty slots.
    pub fn empty(slot: impl Into<String>) -> Self {
        Self {
            id: Reading::Text(slot.into()),
            remain: None,
            tray_uuid: None,
            tray_color: None,
            tray_sub_brands: None,
            tray_weight: None,
            other: BTreeMap::new(),
        }
    }

    /// Returns `true` when the slot id is the only field present.
    #[must_use]
    pub fn is_empty_slot(&self) -> bool {
        self.remain.is_none()
            && self.tray_uuid.is_none()
            && self.tray_color.is_none()
            && self.tray_sub_brands.is_none()
            && self.tray_weight.is_none()
            && self.other.is_empty()
    }
}

/// A feeder unit as decoded from a printer report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawUnit {
    pub id: Reading,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<Reading>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<Reading>,

    #[serde(default)]
    pub tray: Vec<RawTray>,

    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// Complete reading of one feeder unit.
///
/// Used as the change-detection baseline: a unit is reprocessed only when a
/// new snapshot is not structurally equal to the stored one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSnapshot {
    pub unit: AmsUnitId,
    pub temperature: Option<Reading>,
    pub humidity: Option<Reading>,
    pub trays: Vec<RawTray>,
    pub other: BTreeMap<String, Value>,
}

impl UnitSnapshot {
    /// Create a snapshot with no ambient readings.
    pub fn new(unit: AmsUnitId, trays: Vec<RawTray>) -> Self {
        Self {
            unit,
            temperature: None,
            humidity: None,
            trays,
            other: BTreeMap::new(),
        }
    }
}

impl TryFrom<RawUnit> for UnitSnapshot {
    type Error = Error;

    fn try_from(raw: RawUnit) -> Result<Self> {
        let unit = AmsUnitId::try_from(&raw.id)?;
        Ok(Self {
            unit,
            temperature: raw.temp,
            humidity: raw.humidity,
            trays: raw.tray,
            other: raw.other,
        })
    }
}

/// Tray color as `RRGGBBAA` hex, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrayColor(String);

impl TrayColor {
    /// Create a color from a 6 or 8 digit hex string.
    ///
    /// # Errors
    /// Returns `Error::InvalidColor` for any other length or non-hex input.
    pub fn new(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if !matches!(hex.len(), 6 | 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(hex.to_string()));
        }
        Ok(TrayColor(hex.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `RRGGBB` part, without alpha.
    #[must_use]
    pub fn rgb(&self) -> &str {
        &self.0[..6]
    }

    /// Compare against a catalog `RRGGBB` color, ignoring case.
    ///
    /// Only the tray side carries alpha; a catalog value with alpha never matches.
    #[must_use]
    pub fn matches_hex(&self, hex: &str) -> bool {
        hex.eq_ignore_ascii_case(self.rgb())
    }
}

impl fmt::Display for TrayColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated tray reading, ready for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct TraySnapshot {
    pub unit: AmsUnitId,
    pub slot: String,
    /// Remaining filament, 0-100.
    pub remain_percent: f64,
    /// Gross filament weight of a full spool, in grams.
    pub tray_weight: f64,
    pub tray_uuid: String,
    pub color: TrayColor,
    pub sub_brand: String,
}

impl TraySnapshot {
    /// Estimated filament left on the spool, in grams.
    #[must_use]
    pub fn remaining_weight(&self) -> f64 {
        remaining_weight(self.tray_weight, self.remain_percent)
    }

    /// Position label such as `A0`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}{}", self.unit, self.slot)
    }
}

/// Remaining filament weight from the tray's gross weight and remaining percent.
#[must_use]
pub fn remaining_weight(gross_weight: f64, remain_percent: f64) -> f64 {
    (remain_percent / 100.0) * gross_weight
}

/// The spool extra field that records which tray claims a spool.
///
/// The inventory service expects extra-field keys in lower case, while the
/// field itself is registered under the configured display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagField {
    name: String,
    key: String,
}

impl TagField {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = name.to_lowercase();
        Self { name, key }
    }

    /// Display name the field is registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key used in a spool's extra map.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Encode a tray UUID as an extra-field value.
    ///
    /// Extra values are JSON documents, so a plain string is stored quoted.
    #[must_use]
    pub fn encode(&self, tray_uuid: &str) -> String {
        Value::String(tray_uuid.to_string()).to_string()
    }
}

impl Default for TagField {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_FIELD)
    }
}
