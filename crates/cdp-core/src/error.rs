//! Error types for the sandbox core
//!
//! Every failure aborts the action that raised it and leaves the persisted
//! state untouched:
//! - Input validation (missing names, empty schemas, incomplete segments)
//! - Lookups of schemas, profiles or segments that do not exist
//! - Store and configuration failures

use cdp_store::StoreError;
use std::path::PathBuf;

/// Main sandbox error type
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Schema saved without a name
    #[error("schema name required")]
    SchemaNameRequired,

    /// Schema saved without fields
    #[error("add at least one field")]
    NoFields,

    /// A field has an empty name
    #[error("all fields must have a name (field #{position} is empty)")]
    UnnamedField { position: usize },

    /// Schema lookup failed
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// Requested generation batch exceeds the limit
    #[error("cannot generate {requested} profiles at once (limit {max})")]
    CountTooLarge { requested: usize, max: usize },

    /// Segment created with a missing name, field or value
    #[error("segment name, field and value are all required")]
    SegmentFieldsRequired,

    /// Segment index out of range
    #[error("segment not found at index {index} ({available} defined)")]
    SegmentNotFound { index: usize, available: usize },

    /// Profile index out of range
    #[error("profile not found at index {index} ({available} stored)")]
    ProfileNotFound { index: usize, available: usize },

    /// Store read or write failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Document could not be serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// IO error outside the store (export, config files)
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlatformError {
    /// Check if error was caused by user input rather than the environment
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SchemaNameRequired
                | Self::NoFields
                | Self::UnnamedField { .. }
                | Self::SchemaNotFound(_)
                | Self::CountTooLarge { .. }
                | Self::SegmentFieldsRequired
                | Self::SegmentNotFound { .. }
                | Self::ProfileNotFound { .. }
        )
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for sandbox operations
pub type PlatformResult<T> = Result<T, PlatformError>;
