use std::sync::Arc;

use picbed::config::{Config, ConfigStore, DEFAULT_BRANCH, DEFAULT_PATH, DEFAULT_REPO};
use picbed::storage::{FileStore, KeyValueStore, MemoryStore};

fn store() -> ConfigStore {
    ConfigStore::new(Arc::new(MemoryStore::new()))
}

fn candidate(token: &str, owner: &str) -> Config {
    Config {
        token: token.to_string(),
        owner: owner.to_string(),
        repo: String::new(),
        branch: String::new(),
        path: String::new(),
    }
}

#[test]
fn save_then_load_round_trips_with_defaults_applied() {
    let config_store = store();

    config_store
        .save(candidate("  abc  ", "alice"))
        .expect("save should succeed");

    let loaded = config_store.load().unwrap().expect("config present");
    assert_eq!(loaded.token, "abc");
    assert_eq!(loaded.owner, "alice");
    assert_eq!(loaded.repo, DEFAULT_REPO);
    assert_eq!(loaded.branch, DEFAULT_BRANCH);
    assert_eq!(loaded.path, DEFAULT_PATH);
}

#[test]
fn save_keeps_explicit_optional_fields() {
    let config_store = store();

    let saved = config_store
        .save(Config {
            token: "abc".to_string(),
            owner: "alice".to_string(),
            repo: "imgs".to_string(),
            branch: "release".to_string(),
            path: "assets/pics".to_string(),
        })
        .unwrap();

    assert_eq!(saved, config_store.load().unwrap().unwrap());
    assert_eq!(saved.repo, "imgs");
    assert_eq!(saved.branch, "release");
    assert_eq!(saved.path, "assets/pics");
}

#[test]
fn save_with_empty_token_writes_nothing() {
    let config_store = store();

    assert!(config_store.save(candidate("   ", "alice")).is_err());
    assert!(config_store.load().unwrap().is_none());
}

#[test]
fn rejected_save_leaves_prior_config_unchanged() {
    let config_store = store();
    let original = config_store.save(candidate("abc", "alice")).unwrap();

    assert!(config_store.save(candidate("new-token", "  ")).is_err());
    assert_eq!(config_store.load().unwrap().unwrap(), original);
}

#[test]
fn load_returns_none_when_never_saved() {
    assert!(store().load().unwrap().is_none());
}

#[test]
fn unparsable_stored_config_is_treated_as_absent() {
    let kv = Arc::new(MemoryStore::new());
    kv.set("config", "not json at all").unwrap();

    let config_store = ConfigStore::new(kv);
    assert!(config_store.load().unwrap().is_none());
}

#[test]
fn file_store_persists_config_across_instances() {
    let dir = tempfile::tempdir().unwrap();

    let first = ConfigStore::new(Arc::new(FileStore::new(dir.path())));
    first.save(candidate("abc", "alice")).unwrap();

    let second = ConfigStore::new(Arc::new(FileStore::new(dir.path())));
    let loaded = second.load().unwrap().unwrap();
    assert_eq!(loaded.owner, "alice");
    assert_eq!(loaded.repo, DEFAULT_REPO);
}
