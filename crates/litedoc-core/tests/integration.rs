//! Integration tests: the full open -> mutate -> save -> reopen pipeline
//! through the public `DocumentStore` API, on real files.

use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;

use litedoc_core::{patterns, Config, DocError, DocumentStore, ObfuscationKey, SearchMode};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_store() -> (DocumentStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::open(Config::plain(dir.path())).unwrap();
    (store, dir)
}

fn on_disk(dir: &TempDir) -> Value {
    let text = fs::read_to_string(dir.path().join("database.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ---------------------------------------------------------------------------
// Users scenario
// ---------------------------------------------------------------------------

#[test]
fn test_users_scenario() {
    let (store, dir) = test_store();
    assert_eq!(store.dump_all(), json!({}));

    store.set_data("users/1", json!({"firstName": "John", "lastName": "Doe"})).unwrap();
    assert_eq!(
        store.get_data("users/1").unwrap(),
        json!({"firstName": "John", "lastName": "Doe"})
    );

    store.set_subcollection("users/1", "groups", json!({"name": "Admins"})).unwrap();
    assert_eq!(store.get_data("users/1").unwrap()["groups"], json!({"name": "Admins"}));

    store.set_regex("email", "^[^@]+@[^@]+$").unwrap();
    let err = store.set_data("users/2", json!({"email": "bad"})).unwrap_err();
    assert!(matches!(err, DocError::Validation { .. }));
    assert!(!store.key_exists("users/2"));

    // disk matches memory after every successful mutation
    assert_eq!(on_disk(&dir), store.dump_all());
    assert_eq!(on_disk(&dir)["_regex"]["email"], json!("^[^@]+@[^@]+$"));
}

// ---------------------------------------------------------------------------
// Create / edit / delete
// ---------------------------------------------------------------------------

#[test]
fn test_set_twice_keeps_first_value() {
    let (store, dir) = test_store();
    store.set_data("config/theme", json!({"mode": "dark"})).unwrap();

    let err = store.set_data("config/theme", json!({"mode": "light"})).unwrap_err();
    assert!(err.is_already_exists());
    assert!(err.to_string().contains("edit_data"));
    assert_eq!(store.get_data("config/theme").unwrap(), json!({"mode": "dark"}));
    assert_eq!(on_disk(&dir)["config"]["theme"]["mode"], json!("dark"));
}

#[test]
fn test_edit_deep_merges() {
    let (store, _dir) = test_store();
    store.set_data("users/1", json!({
        "name": "John",
        "profile": {"city": "Paris", "zip": "75001"},
        "tags": ["a", "b", "c"]
    })).unwrap();

    store.edit_data("users/1", json!({
        "name": "Johnny",
        "profile": {"zip": "75002"},
        "tags": ["z"]
    })).unwrap();

    assert_eq!(store.get_data("users/1").unwrap(), json!({
        "name": "Johnny",
        "profile": {"city": "Paris", "zip": "75002"},
        "tags": ["z"]
    }));
}

#[test]
fn test_delete_leaves_siblings() {
    let (store, _dir) = test_store();
    store.set_data("users/1", json!({"name": "a"})).unwrap();
    store.set_data("users/2", json!({"name": "b"})).unwrap();
    store.set_data("teams/1", json!({"name": "c"})).unwrap();

    store.delete_data("users/1").unwrap();
    assert_eq!(store.dump_all(), json!({
        "users": {"2": {"name": "b"}},
        "teams": {"1": {"name": "c"}}
    }));

    let before = store.dump_all();
    assert!(store.delete_data("users/1").unwrap_err().is_not_found());
    assert_eq!(store.dump_all(), before);
}

#[test]
fn test_write_through_scalar_intermediate() {
    let (store, _dir) = test_store();
    store.set_data("a", json!("scalar")).unwrap();
    // "a/b" does not resolve, so the create goes ahead and replaces "a"
    store.set_data("a/b", json!(1)).unwrap();
    assert_eq!(store.get_data("a").unwrap(), json!({"b": 1}));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_preset_patterns() {
    let (store, _dir) = test_store();
    store.set_regex("email", patterns::EMAIL).unwrap();
    store.set_regex("postalCode", patterns::POSTAL_CODE).unwrap();

    store.set_data("users/1", json!({"email": "example@domain.com", "postalCode": 75001})).unwrap();
    let err = store.set_data("users/2", json!({"email": "example@domain.com", "postalCode": "7500"}))
        .unwrap_err();
    match err {
        DocError::Validation { key, .. } => assert_eq!(key, "postalCode"),
        other => panic!("Expected Validation error, got {:?}", other),
    }
    assert!(!store.key_exists("users/2"));
}

#[test]
fn test_patterns_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = DocumentStore::open(Config::plain(dir.path())).unwrap();
        store.set_regex("time", patterns::TIME).unwrap();
    }
    let store = DocumentStore::open(Config::plain(dir.path())).unwrap();
    assert!(store.set_data("events/1", json!({"time": "25:00"})).unwrap_err().is_validation());
    store.set_data("events/1", json!({"time": "09:30"})).unwrap();
}

#[test]
fn test_pattern_table_only_written_through_set_regex() {
    let (store, dir) = test_store();
    store.set_regex("count", "^[0-9]+$").unwrap();

    let err = store.set_data("_regex/email", json!("([bad")).unwrap_err();
    assert!(matches!(err, DocError::InvalidPath { .. }));
    assert_eq!(on_disk(&dir)["_regex"], json!({"count": "^[0-9]+$"}));

    // 5.0 is the number 5 and passes a digits-only pattern
    store.set_data("items/1", json!({"count": 5.0, "email": "x"})).unwrap();
    let found = store.search_with(&json!(5), Some("items"), SearchMode::Strict).unwrap();
    assert_eq!(found.keys().collect::<Vec<_>>(), vec!["1/count"]);
}

#[test]
fn test_subcollection_data_validated() {
    let (store, _dir) = test_store();
    store.set_data("users/1", json!({"name": "John"})).unwrap();
    store.set_regex("hexColor", patterns::HEX_COLOR).unwrap();

    let err = store.set_subcollection("users/1", "prefs", json!({"hexColor": "blue"})).unwrap_err();
    assert!(err.is_validation());
    assert!(!store.key_exists("users/1/prefs"));
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn test_search_loose_and_strict() {
    let (store, _dir) = test_store();
    store.set_data("users/1", json!({"age": 5, "scores": [5, 7]})).unwrap();
    store.set_data("users/2", json!({"age": "5"})).unwrap();

    let loose = store.search(&json!(5), None).unwrap();
    let paths: Vec<&String> = loose.keys().collect();
    assert_eq!(paths, vec!["users/1/age", "users/1/scores/0", "users/2/age"]);

    let strict = store.search_with(&json!(5), Some("users/2"), SearchMode::Strict).unwrap();
    assert!(strict.is_empty());
}

// ---------------------------------------------------------------------------
// Obfuscation
// ---------------------------------------------------------------------------

#[test]
fn test_obfuscated_file_is_not_plain_json() {
    let dir = TempDir::new().unwrap();
    let key = ObfuscationKey::new("mySecretKey").unwrap();
    let store = DocumentStore::open(Config::obfuscated(dir.path(), key.clone())).unwrap();
    store.set_data("users/1", json!({"email": "example@domain.com"})).unwrap();

    let raw = fs::read(dir.path().join("database.json")).unwrap();
    assert!(serde_json::from_slice::<Value>(&raw).is_err());
    assert!(!String::from_utf8_lossy(&raw).contains("example"));

    drop(store);
    let store = DocumentStore::open(Config::obfuscated(dir.path(), key)).unwrap();
    assert_eq!(store.get_data("users/1/email").unwrap(), json!("example@domain.com"));
}

#[test]
fn test_opening_obfuscated_file_with_wrong_key_fails() {
    let dir = TempDir::new().unwrap();
    {
        let key = ObfuscationKey::new("right-key").unwrap();
        let store = DocumentStore::open(Config::obfuscated(dir.path(), key)).unwrap();
        store.set_data("a", json!(1)).unwrap();
    }
    let wrong = ObfuscationKey::new("wrong-key").unwrap();
    assert!(DocumentStore::open(Config::obfuscated(dir.path(), wrong)).is_err());
}

// ---------------------------------------------------------------------------
// Backup / restore
// ---------------------------------------------------------------------------

#[test]
fn test_backup_corrupt_restore() {
    let (store, dir) = test_store();
    store.set_data("users/1", json!({"name": "John"})).unwrap();
    let info = store.backup("before.bak").unwrap();
    let snapshot = fs::read(dir.path().join("database.json")).unwrap();
    assert_eq!(info.bytes, snapshot.len() as u64);

    store.edit_data("users/1", json!({"name": "Changed"})).unwrap();
    fs::write(dir.path().join("database.json"), b"\x00corrupt").unwrap();

    store.restore("before.bak").unwrap();
    assert_eq!(fs::read(dir.path().join("database.json")).unwrap(), snapshot);
    assert_eq!(store.get_data("users/1/name").unwrap(), json!("John"));
}

#[test]
fn test_restore_after_live_file_deleted() {
    let (store, dir) = test_store();
    store.set_data("k", json!([1, 2, 3])).unwrap();
    store.backup("snap.bak").unwrap();

    fs::remove_file(dir.path().join("database.json")).unwrap();
    store.restore("snap.bak").unwrap();

    let reopened = DocumentStore::open(Config::plain(dir.path())).unwrap();
    assert_eq!(reopened.get_data("k").unwrap(), json!([1, 2, 3]));
}

#[test]
fn test_obfuscated_backup_is_verbatim() {
    let dir = TempDir::new().unwrap();
    let key = ObfuscationKey::new("k3y").unwrap();
    let store = DocumentStore::open(Config::obfuscated(dir.path(), key)).unwrap();
    store.set_data("x", json!({"y": true})).unwrap();

    let info = store.backup("x.bak").unwrap();
    assert_eq!(
        fs::read(&info.path).unwrap(),
        fs::read(dir.path().join("database.json")).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

#[test]
fn test_open_existing_invalid_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("database.json"), b"{\"unterminated\": ").unwrap();
    let err = DocumentStore::open(Config::plain(dir.path())).unwrap_err();
    assert!(matches!(err, DocError::Parse { .. }));
}

#[test]
fn test_open_without_create() {
    let dir = TempDir::new().unwrap();
    let config = Config::plain(dir.path().join("missing")).with_create_if_missing(false);
    assert!(matches!(DocumentStore::open(config).unwrap_err(), DocError::Io { .. }));
}

#[test]
fn test_custom_file_name_and_unsynced_writes() {
    let dir = TempDir::new().unwrap();
    let config = Config::plain(dir.path())
        .with_file_name("testdb.json")
        .with_sync_writes(false);
    let store = DocumentStore::open(config).unwrap();
    store.set_data("a", json!(1)).unwrap();
    assert!(dir.path().join("testdb.json").exists());
    assert!(!dir.path().join("database.json").exists());
}
