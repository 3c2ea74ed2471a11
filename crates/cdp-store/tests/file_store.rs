use cdp_store::{FileStore, KeyValueStore, StoreError};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::fs;

#[test]
fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("state.json")).unwrap();
    assert!(store.keys().is_empty());
    // nothing written until first mutation
    assert!(!dir.path().join("state.json").exists());
}

#[test]
fn values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let mut store = FileStore::open(&path).unwrap();
        store
            .set("schemas", &vec![json!({"name": "Customer", "fields": []})])
            .unwrap();
        store.set("segments", &Vec::<Value>::new()).unwrap();
    }

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.keys(), vec!["schemas".to_string(), "segments".to_string()]);
    let schemas: Vec<Value> = store.get("schemas").unwrap().unwrap();
    assert_eq!(schemas[0]["name"], "Customer");
}

#[test]
fn creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/state.json");

    let mut store = FileStore::open(&path).unwrap();
    store.set("journeys", &Vec::<Value>::new()).unwrap();
    assert!(path.exists());
    assert!(!dir.path().join("nested/deeper/state.json.tmp").exists());
}

#[test]
fn remove_is_written_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut store = FileStore::open(&path).unwrap();
    store.set("profiles", &vec![json!({"a": 1})]).unwrap();
    assert!(store.remove("profiles").unwrap());

    let reopened = FileStore::open(&path).unwrap();
    assert!(!reopened.contains("profiles"));
}

#[test]
fn non_object_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    let err = FileStore::open(&path).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}

#[test]
fn invalid_json_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        FileStore::open(&path),
        Err(StoreError::Corrupt { .. })
    ));
}

#[test]
fn blank_file_is_empty_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "  \n").unwrap();

    let store = FileStore::open(&path).unwrap();
    assert!(store.keys().is_empty());
}

proptest! {
    #[test]
    fn prop_string_lists_roundtrip_through_disk(values in prop::collection::vec("[a-zA-Z0-9 _-]{0,12}", 0..8)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("segments", &values).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        let back: Vec<String> = reopened.get("segments").unwrap().unwrap();
        prop_assert_eq!(back, values);
    }
}
