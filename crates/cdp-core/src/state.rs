//! Typed view of the persisted namespace
//!
//! Four keys, each a JSON list: `schemas`, `profiles`, `segments`, `journeys`.
//! There is no version marker and no migration.

use crate::error::PlatformResult;
use crate::schema::SchemaRegistry;
use crate::segment::SegmentRules;
use crate::types::{ExportDocument, Field, FieldType, JourneyRecord, Profile, Schema, Segment};
use cdp_store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key of the schema list
pub const SCHEMAS_KEY: &str = "schemas";
/// Key of the profile list
pub const PROFILES_KEY: &str = "profiles";
/// Key of the segment list
pub const SEGMENTS_KEY: &str = "segments";
/// Key of the journey record list
pub const JOURNEYS_KEY: &str = "journeys";

/// In-memory copy of everything persisted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformState {
    /// Schema definitions
    pub schemas: SchemaRegistry,
    /// Generated and seeded profiles
    pub profiles: Vec<Profile>,
    /// Segment rules
    pub segments: SegmentRules,
    /// Journey start log
    pub journeys: Vec<JourneyRecord>,
}

impl PlatformState {
    /// Read all four keys from `store`
    ///
    /// With `seed_demo_data`, absent keys are initialised with the demo
    /// content and written back; otherwise they read as empty lists and the
    /// store is left alone.
    ///
    /// # Errors
    /// Store failures, or a key holding something other than the expected list.
    pub fn load<S: KeyValueStore>(store: &mut S, seed_demo_data: bool) -> PlatformResult<Self> {
        let schemas: Vec<Schema> = load_or_seed(store, SCHEMAS_KEY, seed_demo_data, demo_schemas)?;
        let profiles: Vec<Profile> =
            load_or_seed(store, PROFILES_KEY, seed_demo_data, demo_profiles)?;
        let segments: Vec<Segment> = load_or_seed(store, SEGMENTS_KEY, seed_demo_data, Vec::new)?;
        let journeys: Vec<JourneyRecord> =
            load_or_seed(store, JOURNEYS_KEY, seed_demo_data, Vec::new)?;

        tracing::debug!(
            schemas = schemas.len(),
            profiles = profiles.len(),
            segments = segments.len(),
            journeys = journeys.len(),
            "loaded state"
        );

        Ok(Self {
            schemas: SchemaRegistry::from_schemas(schemas),
            profiles,
            segments: SegmentRules::from_segments(segments),
            journeys,
        })
    }

    /// Write all four keys to `store`
    ///
    /// # Errors
    /// Store failures.
    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> PlatformResult<()> {
        store.set(SCHEMAS_KEY, &self.schemas)?;
        store.set(PROFILES_KEY, &self.profiles)?;
        store.set(SEGMENTS_KEY, &self.segments)?;
        store.set(JOURNEYS_KEY, &self.journeys)?;
        Ok(())
    }

    /// Schemas, profiles and segments as one document
    #[must_use]
    pub fn export_document(&self) -> ExportDocument {
        ExportDocument {
            schemas: self.schemas.list().to_vec(),
            profiles: self.profiles.clone(),
            segments: self.segments.list().to_vec(),
        }
    }
}

fn load_or_seed<S, T, F>(store: &mut S, key: &str, seed: bool, initial: F) -> PlatformResult<Vec<T>>
where
    S: KeyValueStore,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Vec<T>,
{
    if let Some(values) = store.get::<Vec<T>>(key)? {
        return Ok(values);
    }
    if !seed {
        return Ok(Vec::new());
    }

    let values = initial();
    store.set(key, &values)?;
    tracing::info!(key, entries = values.len(), "initialised missing key");
    Ok(values)
}

/// The demo `Customer` schema
#[must_use]
pub fn demo_schemas() -> Vec<Schema> {
    vec![Schema::new(
        "Customer",
        vec![
            Field::identity("CustomerID"),
            Field::new("email", FieldType::String),
            Field::new("firstName", FieldType::String),
            Field::new("lastName", FieldType::String),
        ],
    )]
}

/// Three demo customers matching [`demo_schemas`]
#[must_use]
pub fn demo_profiles() -> Vec<Profile> {
    [
        ("1001", "peter@example.com", "Peter", "Parker"),
        ("1002", "bruce@example.com", "Bruce", "Wayne"),
        ("1003", "diana@example.com", "Diana", "Prince"),
    ]
    .into_iter()
    .map(|(id, email, first, last)| {
        Profile::new()
            .with("CustomerID", id)
            .with("email", email)
            .with("firstName", first)
            .with("lastName", last)
    })
    .collect()
}
