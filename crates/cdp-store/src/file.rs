//! File-backed store
//!
//! The whole namespace is one JSON object on disk. It is read once when the
//! store is opened and rewritten after every mutation, going through a
//! sibling temp file and a rename so a crash never leaves a half-written file.

use crate::error::{StoreError, StoreResult};
use crate::KeyValueStore;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Store persisted as a single JSON object file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl FileStore {
    /// Open the store at `path`
    ///
    /// A missing file is an empty namespace; nothing is written until the
    /// first mutation.
    ///
    /// # Errors
    /// - [`StoreError::Io`] if the file exists but cannot be read
    /// - [`StoreError::Corrupt`] if it does not hold a JSON object
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Map::new(),
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(StoreError::corrupt(
                        &path,
                        format!("expected a JSON object, found {}", json_kind(&other)),
                    ))
                }
                Err(e) => return Err(StoreError::corrupt(&path, e.to_string())),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(StoreError::io_error(&path, e)),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self { path, entries })
    }

    /// Path of the backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io_error(parent, e))?;
        }

        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StoreError::serialization("<namespace>", e))?;

        let tmp = self.tmp_path();
        fs::write(&tmp, text).map_err(|e| StoreError::io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io_error(&self.path, e))?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: Value) -> StoreResult<()> {
        let previous = self.entries.insert(key.to_string(), value);
        if let Err(e) = self.persist() {
            // keep memory consistent with disk
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<bool> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.persist() {
            self.entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_path_is_sibling() {
        let store = FileStore {
            path: PathBuf::from("/var/lib/cdp/state.json"),
            entries: Map::new(),
        };
        assert_eq!(store.tmp_path(), PathBuf::from("/var/lib/cdp/state.json.tmp"));
    }

    #[test]
    fn json_kind_names() {
        assert_eq!(json_kind(&Value::Array(vec![])), "an array");
        assert_eq!(json_kind(&Value::Null), "null");
    }
}
