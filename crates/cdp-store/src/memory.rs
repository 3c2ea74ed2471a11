//! In-process store

use crate::error::StoreResult;
use crate::KeyValueStore;
use serde_json::Value;
use std::collections::BTreeMap;

/// Store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys present
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: Value) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_absent_key_is_none() {
        let store = MemoryStore::new();
        let value: Option<Vec<String>> = store.get("profiles").unwrap();
        assert!(value.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_set_and_get() {
        let mut store = MemoryStore::new();
        store.set("segments", &vec![json!({"name": "vip"})]).unwrap();

        let back: Option<Vec<Value>> = store.get("segments").unwrap();
        assert_eq!(back.unwrap()[0]["name"], "vip");
        assert!(store.contains("segments"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_store_null_reads_as_none() {
        let mut store = MemoryStore::new();
        store.set_raw("schemas", Value::Null).unwrap();
        let back: Option<Vec<Value>> = store.get("schemas").unwrap();
        assert!(back.is_none());
    }

    #[test]
    fn memory_store_type_mismatch_is_error() {
        let mut store = MemoryStore::new();
        store.set("journeys", "not a list").unwrap();
        let back: Result<Option<Vec<Value>>, _> = store.get("journeys");
        assert!(back.is_err());
    }

    #[test]
    fn memory_store_remove() {
        let mut store = MemoryStore::new();
        store.set("profiles", &Vec::<Value>::new()).unwrap();
        assert!(store.remove("profiles").unwrap());
        assert!(!store.remove("profiles").unwrap());
        assert!(store.keys().is_empty());
    }
}
