//! Schema registry
//!
//! Holds the named field-list definitions. Saving a schema is an upsert keyed
//! by name that first normalises the draft:
//! - names are trimmed and must be non-empty
//! - at least one field is required
//! - only the first identity field keeps its flag (and becomes type `id`);
//!   later identity fields are demoted, and an `id` type on them becomes `string`

use crate::error::{PlatformError, PlatformResult};
use crate::types::{Field, FieldType, Schema};
use serde::{Deserialize, Serialize};

/// Whether a save created a schema or replaced an existing one's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New schema appended
    Created,
    /// Existing schema's fields replaced
    Updated,
}

/// Ordered collection of schemas, unique by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    schemas: Vec<Schema>,
}

impl SchemaRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing list
    #[inline]
    #[must_use]
    pub fn from_schemas(schemas: Vec<Schema>) -> Self {
        Self { schemas }
    }

    /// Validate, normalise and upsert `draft`
    ///
    /// # Errors
    /// - [`PlatformError::SchemaNameRequired`] for a blank name
    /// - [`PlatformError::NoFields`] for an empty field list
    /// - [`PlatformError::UnnamedField`] for a blank field name (1-based position)
    ///
    /// On error the registry is unchanged.
    pub fn save(&mut self, draft: Schema) -> PlatformResult<SaveOutcome> {
        let schema = normalize(draft)?;

        if let Some(existing) = self.schemas.iter_mut().find(|s| s.name == schema.name) {
            existing.fields = schema.fields;
            tracing::debug!(schema = %existing.name, "schema fields replaced");
            Ok(SaveOutcome::Updated)
        } else {
            tracing::debug!(schema = %schema.name, fields = schema.fields.len(), "schema added");
            self.schemas.push(schema);
            Ok(SaveOutcome::Created)
        }
    }

    /// Remove schema by name, returning it
    pub fn delete(&mut self, name: &str) -> Option<Schema> {
        let idx = self.schemas.iter().position(|s| s.name == name)?;
        Some(self.schemas.remove(idx))
    }

    /// Schema by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Check if schema exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All schemas in insertion order
    #[inline]
    #[must_use]
    pub fn list(&self) -> &[Schema] {
        &self.schemas
    }

    /// Schema names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|s| s.name.as_str())
    }

    /// Distinct field names across all schemas, first-seen order
    ///
    /// These are the fields a segment may be built on.
    #[must_use]
    pub fn all_field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for field in self.schemas.iter().flat_map(|s| s.fields.iter()) {
            if !names.contains(&field.name) {
                names.push(field.name.clone());
            }
        }
        names
    }

    /// Number of schemas
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Short description of a field: `name (id)` for the identity, else `name (type)`
#[must_use]
pub fn field_summary(field: &Field) -> String {
    if field.identity {
        format!("{} (id)", field.name)
    } else {
        format!("{} ({})", field.name, field.field_type)
    }
}

fn normalize(draft: Schema) -> PlatformResult<Schema> {
    let name = draft.name.trim().to_string();
    if name.is_empty() {
        return Err(PlatformError::SchemaNameRequired);
    }
    if draft.fields.is_empty() {
        return Err(PlatformError::NoFields);
    }

    let mut fields = Vec::with_capacity(draft.fields.len());
    for (i, field) in draft.fields.into_iter().enumerate() {
        let field_name = field.name.trim().to_string();
        if field_name.is_empty() {
            return Err(PlatformError::UnnamedField { position: i + 1 });
        }
        fields.push(Field {
            name: field_name,
            ..field
        });
    }

    let mut found_identity = false;
    for field in fields.iter_mut().filter(|f| f.identity) {
        if found_identity {
            field.identity = false;
            if field.field_type == FieldType::Id {
                field.field_type = FieldType::String;
            }
        } else {
            found_identity = true;
            field.field_type = FieldType::Id;
        }
    }

    Ok(Schema { name, fields })
}
