//! The sandbox facade
//!
//! Owns the store, the typed state, the profile generator and the journey
//! stepper. Every mutation follows the same order:
//! 1. Validate and build the new value on a copy
//! 2. Write it to the store
//! 3. Swap it into the in-memory state
//!
//! so a failure at any step leaves both store and state as they were.

use crate::config::PlatformConfig;
use crate::error::{PlatformError, PlatformResult};
use crate::generator::{Clock, ProfileGenerator, SystemClock, MAX_BATCH_SIZE};
use crate::journey::{self, JourneyPlayback, JourneyStepper, PlaybackObserver};
use crate::schema::SaveOutcome;
use crate::state::{PlatformState, JOURNEYS_KEY, PROFILES_KEY, SCHEMAS_KEY, SEGMENTS_KEY};
use crate::types::{ExportDocument, JourneyRecord, Profile, Schema, Segment};
use crate::views::{self, QuickStats};
use cdp_store::KeyValueStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Customer-data sandbox over a key/value store
#[derive(Debug)]
pub struct Platform<S: KeyValueStore> {
    store: S,
    state: PlatformState,
    config: PlatformConfig,
    generator: ProfileGenerator,
    clock: Arc<dyn Clock>,
    journeys: JourneyStepper,
}

impl<S: KeyValueStore> Platform<S> {
    /// Load state from `store`, seeding absent keys if configured
    ///
    /// # Errors
    /// Store failures or stored data of the wrong shape.
    pub fn open(mut store: S, config: PlatformConfig) -> PlatformResult<Self> {
        let state = PlatformState::load(&mut store, config.seed_demo_data)?;
        let generator = ProfileGenerator::from_optional_seed(config.rng_seed);
        let journeys = JourneyStepper::new(config.step_interval());

        tracing::info!(
            schemas = state.schemas.len(),
            profiles = state.profiles.len(),
            segments = state.segments.len(),
            "sandbox opened"
        );

        Ok(Self {
            store,
            state,
            config,
            generator,
            clock: Arc::new(SystemClock),
            journeys,
        })
    }

    /// With clock for generated ids and journey timestamps
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.generator = self.generator.with_clock(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    /// With generator
    #[must_use]
    pub fn with_generator(mut self, generator: ProfileGenerator) -> Self {
        self.generator = generator.with_clock(Arc::clone(&self.clock));
        self
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &PlatformState {
        &self.state
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the sandbox, returning the store
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    // ---- schemas ----

    /// Validate and upsert a schema
    ///
    /// # Errors
    /// Validation errors from [`crate::schema::SchemaRegistry::save`], or store failures.
    pub fn save_schema(&mut self, draft: Schema) -> PlatformResult<SaveOutcome> {
        let mut schemas = self.state.schemas.clone();
        let outcome = schemas.save(draft)?;
        self.store.set(SCHEMAS_KEY, &schemas)?;
        self.state.schemas = schemas;

        tracing::info!(?outcome, schemas = self.state.schemas.len(), "schema saved");
        Ok(outcome)
    }

    /// Delete a schema; profiles generated from it are kept
    ///
    /// # Errors
    /// [`PlatformError::SchemaNotFound`], or store failures.
    pub fn delete_schema(&mut self, name: &str) -> PlatformResult<Schema> {
        let mut schemas = self.state.schemas.clone();
        let removed = schemas
            .delete(name)
            .ok_or_else(|| PlatformError::SchemaNotFound(name.to_string()))?;
        self.store.set(SCHEMAS_KEY, &schemas)?;
        self.state.schemas = schemas;

        tracing::info!(schema = %removed.name, "schema deleted");
        Ok(removed)
    }

    // ---- profiles ----

    /// Generate `count` profiles (at least one) from the named schema and append them
    ///
    /// Returns the number appended.
    ///
    /// # Errors
    /// [`PlatformError::SchemaNotFound`], [`PlatformError::CountTooLarge`] above
    /// [`MAX_BATCH_SIZE`], or store failures.
    pub fn generate_profiles(&mut self, schema_name: &str, count: usize) -> PlatformResult<usize> {
        if count > MAX_BATCH_SIZE {
            return Err(PlatformError::CountTooLarge {
                requested: count,
                max: MAX_BATCH_SIZE,
            });
        }
        let schema = self
            .state
            .schemas
            .get(schema_name)
            .ok_or_else(|| PlatformError::SchemaNotFound(schema_name.to_string()))?;

        let generated = self.generator.generate(schema, count);
        let added = generated.len();

        let mut profiles = self.state.profiles.clone();
        profiles.extend(generated);
        self.store.set(PROFILES_KEY, &profiles)?;
        self.state.profiles = profiles;

        tracing::info!(schema = schema_name, added, total = self.state.profiles.len(), "profiles generated");
        Ok(added)
    }

    /// Remove every profile; schemas and segments are untouched
    ///
    /// Returns the number removed.
    ///
    /// # Errors
    /// Store failures.
    pub fn clear_profiles(&mut self) -> PlatformResult<usize> {
        let removed = self.state.profiles.len();
        self.store.set(PROFILES_KEY, &Vec::<Profile>::new())?;
        self.state.profiles.clear();

        tracing::info!(removed, "profiles cleared");
        Ok(removed)
    }

    /// Profile at `index`
    ///
    /// # Errors
    /// [`PlatformError::ProfileNotFound`].
    pub fn profile(&self, index: usize) -> PlatformResult<&Profile> {
        self.state
            .profiles
            .get(index)
            .ok_or(PlatformError::ProfileNotFound {
                index,
                available: self.state.profiles.len(),
            })
    }

    /// Profiles with any value containing `query`, ignoring case
    #[must_use]
    pub fn search_profiles(&self, query: &str) -> Vec<&Profile> {
        views::search_profiles(&self.state.profiles, query)
    }

    // ---- segments ----

    /// Append a segment rule
    ///
    /// # Errors
    /// [`PlatformError::SegmentFieldsRequired`], or store failures.
    pub fn create_segment(&mut self, name: &str, field: &str, value: &str) -> PlatformResult<Segment> {
        let mut segments = self.state.segments.clone();
        let created = segments.create(name, field, value)?.clone();
        self.store.set(SEGMENTS_KEY, &segments)?;
        self.state.segments = segments;

        tracing::info!(segment = %created.name, field = %created.field, "segment created");
        Ok(created)
    }

    /// Delete the segment at `index`
    ///
    /// # Errors
    /// [`PlatformError::SegmentNotFound`], or store failures.
    pub fn delete_segment(&mut self, index: usize) -> PlatformResult<Segment> {
        let mut segments = self.state.segments.clone();
        let removed = segments.delete(index)?;
        self.store.set(SEGMENTS_KEY, &segments)?;
        self.state.segments = segments;

        tracing::info!(segment = %removed.name, "segment deleted");
        Ok(removed)
    }

    /// Distinct field names a segment can be built on
    #[must_use]
    pub fn segment_fields(&self) -> Vec<String> {
        self.state.schemas.all_field_names()
    }

    // ---- journeys ----

    /// Record a journey start and begin playback
    ///
    /// Any playback already running is cancelled first. Must be called within
    /// a tokio runtime.
    ///
    /// # Errors
    /// [`PlatformError::ProfileNotFound`], [`PlatformError::SegmentNotFound`],
    /// or store failures. Nothing is recorded or played on error.
    pub fn start_journey(
        &mut self,
        profile_index: usize,
        segment_index: Option<usize>,
    ) -> PlatformResult<PlaybackObserver> {
        let profile = self.profile(profile_index)?;
        let segment = match segment_index {
            Some(index) => Some(self.state.segments.get(index).ok_or(
                PlatformError::SegmentNotFound {
                    index,
                    available: self.state.segments.len(),
                },
            )?),
            None => None,
        };

        let steps = journey::script(profile, segment);
        let record = journey::record(profile, self.clock.now_millis());

        let mut journeys = self.state.journeys.clone();
        journeys.push(record);
        self.store.set(JOURNEYS_KEY, &journeys)?;
        self.state.journeys = journeys;

        tracing::info!(profile = profile_index, segment = ?segment_index, "journey started");
        Ok(self.journeys.start(steps))
    }

    /// Cancel the running playback, if any
    pub fn stop_journey(&mut self) -> Option<JourneyPlayback> {
        let stopped = self.journeys.stop();
        if stopped.is_some() {
            tracing::info!("journey stopped");
        }
        stopped
    }

    /// Hand over the tracked playback so the caller can await it
    pub fn take_journey(&mut self) -> Option<JourneyPlayback> {
        self.journeys.take()
    }

    /// Observer of the tracked playback
    #[must_use]
    pub fn current_journey(&self) -> Option<PlaybackObserver> {
        self.journeys.current()
    }

    /// Recorded journey starts
    #[inline]
    #[must_use]
    pub fn journeys(&self) -> &[JourneyRecord] {
        &self.state.journeys
    }

    /// Remove all journey records
    ///
    /// Returns the number removed.
    ///
    /// # Errors
    /// Store failures.
    pub fn clear_journeys(&mut self) -> PlatformResult<usize> {
        let removed = self.state.journeys.len();
        self.store.set(JOURNEYS_KEY, &Vec::<JourneyRecord>::new())?;
        self.state.journeys.clear();
        Ok(removed)
    }

    // ---- export & views ----

    /// Schemas, profiles and segments as one document
    #[must_use]
    pub fn export_document(&self) -> ExportDocument {
        self.state.export_document()
    }

    /// Write the export document as pretty JSON
    ///
    /// With no `path`, writes the configured export file name in the current
    /// directory. Returns the path written.
    ///
    /// # Errors
    /// [`PlatformError::Io`] if the file cannot be written.
    pub fn export_to(&self, path: Option<&Path>) -> PlatformResult<PathBuf> {
        let path = path.map_or_else(|| PathBuf::from(&self.config.export_file_name), Path::to_path_buf);
        let text = serde_json::to_string_pretty(&self.export_document())?;
        std::fs::write(&path, text).map_err(|e| PlatformError::io_error(&path, e))?;

        tracing::info!(path = %path.display(), "state exported");
        Ok(path)
    }

    /// Entity counts
    #[must_use]
    pub fn stats(&self) -> QuickStats {
        QuickStats::from_state(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::FixedClock;
    use crate::types::{Field, FieldType};
    use cdp_store::MemoryStore;

    fn sandbox() -> Platform<MemoryStore> {
        Platform::open(MemoryStore::new(), PlatformConfig::new().with_rng_seed(11))
            .unwrap()
            .with_clock(Arc::new(FixedClock(1_700_000_000_000)))
    }

    #[test]
    fn open_seeds_demo_data() {
        let p = sandbox();
        assert_eq!(p.stats(), QuickStats { schemas: 1, profiles: 3, segments: 0 });
    }

    #[test]
    fn open_without_demo_data() {
        let p = Platform::open(MemoryStore::new(), PlatformConfig::new().with_demo_data(false)).unwrap();
        assert_eq!(p.stats(), QuickStats::default());
        assert!(p.store().is_empty());
    }

    #[test]
    fn save_schema_persists() {
        let mut p = sandbox();
        let outcome = p
            .save_schema(Schema::new("Order", vec![Field::new("total", FieldType::Number)]))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Created);

        let stored: Vec<Schema> = p.store().get(SCHEMAS_KEY).unwrap().unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn failed_save_leaves_store_untouched() {
        let mut p = sandbox();
        let before = p.store().get_raw(SCHEMAS_KEY).unwrap();
        assert!(p.save_schema(Schema::new("", vec![])).is_err());
        assert_eq!(p.store().get_raw(SCHEMAS_KEY).unwrap(), before);
    }

    #[test]
    fn generate_unknown_schema() {
        let mut p = sandbox();
        let err = p.generate_profiles("Nope", 3).unwrap_err();
        assert!(matches!(err, PlatformError::SchemaNotFound(name) if name == "Nope"));
        assert_eq!(p.state().profiles.len(), 3);
    }

    #[test]
    fn generate_rejects_oversized_count() {
        let mut p = sandbox();
        let err = p
            .generate_profiles("Customer", crate::generator::coerce_count("99999999999999999999"))
            .unwrap_err();
        assert!(matches!(err, PlatformError::CountTooLarge { max: MAX_BATCH_SIZE, .. }));
        assert!(err.is_validation());
        assert_eq!(p.state().profiles.len(), 3);
    }

    #[test]
    fn generated_ids_use_clock() {
        let mut p = sandbox();
        p.generate_profiles("Customer", 1).unwrap();
        let id = p.state().profiles[3].get("CustomerID").unwrap().as_str().unwrap().to_string();
        assert!(id.starts_with("1700000000000_"));
    }

    #[test]
    fn delete_segment_out_of_range() {
        let mut p = sandbox();
        assert!(matches!(
            p.delete_segment(0),
            Err(PlatformError::SegmentNotFound { index: 0, available: 0 })
        ));
    }

    #[test]
    fn segment_fields_come_from_schemas() {
        let p = sandbox();
        assert_eq!(
            p.segment_fields(),
            vec!["CustomerID", "email", "firstName", "lastName"]
        );
    }

    #[test]
    fn start_journey_rejects_bad_indexes_without_recording() {
        let mut p = sandbox();
        assert!(matches!(
            p.start_journey(10, None),
            Err(PlatformError::ProfileNotFound { index: 10, available: 3 })
        ));
        assert!(matches!(
            p.start_journey(0, Some(2)),
            Err(PlatformError::SegmentNotFound { index: 2, available: 0 })
        ));
        assert!(p.journeys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn start_journey_records_preview() {
        let mut p = sandbox();
        p.start_journey(1, None).unwrap();

        assert_eq!(p.journeys().len(), 1);
        assert_eq!(p.journeys()[0].profile_preview, "1002 — bruce@example.com");
        assert_eq!(p.journeys()[0].started_at, 1_700_000_000_000);

        let stored: Vec<JourneyRecord> = p.store().get(JOURNEYS_KEY).unwrap().unwrap();
        assert_eq!(stored, p.journeys());
        assert!(p.stop_journey().is_some());
    }

    #[test]
    fn clear_journeys_empties_log() {
        let mut p = sandbox();
        p.state.journeys.push(JourneyRecord {
            started_at: 1,
            profile_preview: "x".into(),
        });
        assert_eq!(p.clear_journeys().unwrap(), 1);
        assert!(p.journeys().is_empty());
    }
}
