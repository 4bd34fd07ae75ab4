use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity kinds that can carry extra fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Vendor,
    Filament,
    Spool,
}

impl EntityType {
    /// Path segment used by the service.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Vendor => "vendor",
            EntityType::Filament => "filament",
            EntityType::Spool => "spool",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    IntegerRange,
    Float,
    FloatRange,
    Datetime,
    Boolean,
    Choice,
}

/// Extra field definition as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub key: String,
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub entity_type: Option<EntityType>,
}

/// Payload for registering an extra field. The key travels in the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewField {
    pub name: String,
    pub field_type: FieldType,
}

impl NewField {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Text,
        }
    }
}
