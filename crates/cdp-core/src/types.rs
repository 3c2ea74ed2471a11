//! Core types for the sandbox
//!
//! Defines the persisted entities:
//! - Schemas and their typed fields
//! - Generated profiles (ordered, free-form maps)
//! - Segment rules
//! - Journey records and the export document

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    #[default]
    String,
    /// Integer
    Number,
    /// Record identifier
    Id,
}

impl FieldType {
    /// Lowercase name as stored and displayed
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Id => "id",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "id" => Ok(FieldType::Id),
            other => Err(format!("unknown field type '{other}' (expected string, number or id)")),
        }
    }
}

/// One field of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, used as the key of generated profile entries
    pub name: String,
    /// Value type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether this field is the record's unique key
    #[serde(default)]
    pub identity: bool,
}

impl Field {
    /// Create a non-identity field
    #[inline]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            identity: false,
        }
    }

    /// Create an identity field of type `id`
    #[inline]
    pub fn identity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Id,
            identity: true,
        }
    }

    /// Mark as identity
    #[inline]
    #[must_use]
    pub fn as_identity(mut self) -> Self {
        self.identity = true;
        self
    }
}

/// A named, ordered list of fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Unique schema name
    pub name: String,
    /// Ordered field definitions
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create schema
    #[inline]
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The identity field, if any
    #[must_use]
    pub fn identity_field(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.identity)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// One generated (or seeded) record
///
/// Keys keep insertion order, which drives previews and table columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(IndexMap<String, Value>);

impl Profile {
    /// Create empty profile
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping the original position on replace
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// With entry
    #[inline]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Value under `key`
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if profile has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Profile {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Single field-equality membership rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Display name
    pub name: String,
    /// Profile field compared
    pub field: String,
    /// Literal the field must loosely equal
    pub value: String,
}

impl Segment {
    /// Create segment
    #[inline]
    pub fn new(name: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Log entry written when a journey is started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyRecord {
    /// Start time, epoch milliseconds
    pub started_at: i64,
    /// First two profile values joined with an em dash
    pub profile_preview: String,
}

/// Full-state export (journeys are not exported)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportDocument {
    /// All schemas
    pub schemas: Vec<Schema>,
    /// All profiles
    pub profiles: Vec<Profile>,
    /// All segments
    pub segments: Vec<Segment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_defaults_when_missing() {
        let field: Field = serde_json::from_value(json!({"name": "email"})).unwrap();
        assert_eq!(field.field_type, FieldType::String);
        assert!(!field.identity);
    }

    #[test]
    fn field_type_serializes_lowercase() {
        let field = Field::identity("CustomerID");
        let v = serde_json::to_value(&field).unwrap();
        assert_eq!(v, json!({"name": "CustomerID", "type": "id", "identity": true}));
    }

    #[test]
    fn field_type_from_str() {
        assert_eq!("Number".parse::<FieldType>().unwrap(), FieldType::Number);
        assert!("boolean".parse::<FieldType>().is_err());
    }

    #[test]
    fn profile_keeps_insertion_order() {
        let p = Profile::new().with("z", 1).with("a", "x").with("m", 2);
        assert_eq!(p.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);

        let text = serde_json::to_string(&p).unwrap();
        assert_eq!(text, r#"{"z":1,"a":"x","m":2}"#);

        let back: Profile = serde_json::from_str(&text).unwrap();
        assert_eq!(back.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn journey_record_uses_camel_case() {
        let r = JourneyRecord {
            started_at: 1_700_000_000_000,
            profile_preview: "1001 — peter@example.com".into(),
        };
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("startedAt").is_some());
        assert!(v.get("profilePreview").is_some());
    }

    #[test]
    fn schema_identity_field() {
        let s = Schema::new(
            "Customer",
            vec![Field::identity("CustomerID"), Field::new("email", FieldType::String)],
        );
        assert_eq!(s.identity_field().unwrap().name, "CustomerID");
        assert_eq!(s.field_names().collect::<Vec<_>>(), vec!["CustomerID", "email"]);
    }
}
