//! CDP Store - flat key/value JSON namespace
//!
//! Every entry is a JSON document stored under a string key. Callers read and
//! write typed values through [`KeyValueStore::get`] and [`KeyValueStore::set`],
//! which are plain JSON (de)serializing passthroughs over the raw entries.
//!
//! Two backends are provided:
//! - [`MemoryStore`] keeps the namespace in process memory
//! - [`FileStore`] keeps it in a single JSON object file, written through on every change
//!
//! # Example
//!
//! ```rust
//! use cdp_store::{KeyValueStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! store.set("segments", &vec!["vip"]).unwrap();
//! let segments: Option<Vec<String>> = store.get("segments").unwrap();
//! assert_eq!(segments, Some(vec!["vip".to_string()]));
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A flat namespace of JSON documents keyed by string
pub trait KeyValueStore {
    /// Read the raw JSON stored under `key`
    ///
    /// # Errors
    /// Backend failures only; an absent key is `Ok(None)`.
    fn get_raw(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Replace the raw JSON stored under `key`
    ///
    /// # Errors
    /// Backend failures (for example the file could not be written).
    fn set_raw(&mut self, key: &str, value: Value) -> StoreResult<()>;

    /// Remove `key`, returning whether it was present
    ///
    /// # Errors
    /// Backend failures.
    fn remove(&mut self, key: &str) -> StoreResult<bool>;

    /// All keys currently present, sorted
    fn keys(&self) -> Vec<String>;

    /// Check if `key` is present
    fn contains(&self, key: &str) -> bool {
        self.keys().iter().any(|k| k == key)
    }

    /// Read and deserialize the value under `key`
    ///
    /// A stored JSON `null` reads back as `None`, same as an absent key.
    ///
    /// # Errors
    /// Backend failures, or [`StoreError::Serialization`] when the stored
    /// document does not match `T`.
    fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get_raw(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => serde_json::from_value(raw)
                .map(Some)
                .map_err(|e| StoreError::serialization(key, e)),
        }
    }

    /// Serialize `value` and store it under `key`
    ///
    /// # Errors
    /// Backend failures, or [`StoreError::Serialization`] if `value` cannot be
    /// represented as JSON.
    fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> StoreResult<()>
    where
        Self: Sized,
    {
        let raw = serde_json::to_value(value).map_err(|e| StoreError::serialization(key, e))?;
        self.set_raw(key, raw)
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
