//! Error types for the key/value store

use std::path::PathBuf;

/// Errors raised while reading or writing the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// A value could not be converted to or from JSON
    #[error("serialization failed for key '{key}': {source}")]
    Serialization {
        /// Key whose value failed to convert
        key: String,
        /// Underlying failure
        #[source]
        source: serde_json::Error,
    },

    /// The backing file exists but is not a JSON object
    #[error("store file {path} is corrupt: {message}")]
    Corrupt {
        /// Store file
        path: PathBuf,
        /// What was wrong with its contents
        message: String,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create serialization error for key
    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }

    /// Create corruption error for path
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_error_display() {
        let err = StoreError::corrupt("/tmp/state.json", "expected object");
        let msg = err.to_string();
        assert!(msg.contains("/tmp/state.json"));
        assert!(msg.contains("expected object"));
    }

    #[test]
    fn io_error_keeps_source() {
        let err = StoreError::io_error(
            "state.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
