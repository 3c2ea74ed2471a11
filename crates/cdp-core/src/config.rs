//! Sandbox configuration
//!
//! Every setting has a default, so an empty TOML document (or no file at all)
//! is a valid configuration.

use crate::error::{PlatformError, PlatformResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the state file
pub const DEFAULT_STORE_PATH: &str = "cdp-state.json";

/// Default export file name
pub const DEFAULT_EXPORT_FILE: &str = "aep_ajo_export.json";

/// Default delay between journey steps
pub const DEFAULT_STEP_INTERVAL_MS: u64 = 700;

/// Sandbox configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// JSON file holding the key/value namespace
    pub store_path: PathBuf,
    /// Delay between journey playback steps, milliseconds
    pub journey_step_interval_ms: u64,
    /// File name used by export when no path is given
    pub export_file_name: String,
    /// Seed for the profile generator; entropy when unset
    pub rng_seed: Option<u64>,
    /// Initialise absent keys with the demo schema and customers
    pub seed_demo_data: bool,
}

impl PlatformConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// [`PlatformError::ConfigError`] if the text is not valid TOML for this struct.
    pub fn from_toml_str(text: &str) -> PlatformResult<Self> {
        toml::from_str(text).map_err(|e| PlatformError::ConfigError(e.to_string()))
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// - [`PlatformError::Io`] if the file cannot be read
    /// - [`PlatformError::ConfigError`] if it cannot be parsed
    pub fn load(path: impl AsRef<Path>) -> PlatformResult<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| PlatformError::io_error(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// With store path
    #[inline]
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// With journey step interval
    #[inline]
    #[must_use]
    pub fn with_step_interval_ms(mut self, ms: u64) -> Self {
        self.journey_step_interval_ms = ms;
        self
    }

    /// With generator seed
    #[inline]
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// With demo data seeding on or off
    #[inline]
    #[must_use]
    pub fn with_demo_data(mut self, enabled: bool) -> Self {
        self.seed_demo_data = enabled;
        self
    }

    /// Journey step interval as a duration
    #[inline]
    #[must_use]
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.journey_step_interval_ms)
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            journey_step_interval_ms: DEFAULT_STEP_INTERVAL_MS,
            export_file_name: DEFAULT_EXPORT_FILE.to_string(),
            rng_seed: None,
            seed_demo_data: true,
        }
    }
}
