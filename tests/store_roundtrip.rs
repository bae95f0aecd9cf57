//! Preference store behavior: key round-trips and degradation paths.

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tomadoro::StoreService;

#[tokio::test]
async fn every_known_key_round_trips_in_memory() {
    let dir = TempDir::new().expect("temp dir");
    let store = StoreService::new(dir.path());

    let entries = [
        ("theme", json!("Purple")),
        ("backgroundImage", json!("data:image/png;base64,CCCC")),
        ("pomodorosCompleted", json!(9)),
        ("pomodoroDuration", json!(30)),
        ("shortBreakDuration", json!(10)),
        ("longBreakDuration", json!(20)),
    ];

    for (key, value) in &entries {
        store.set(*key, value.clone()).await.expect("set");
    }
    for (key, value) in &entries {
        assert_eq!(store.get(key).await.as_ref(), Some(value));
    }
}

#[tokio::test]
async fn values_survive_a_fresh_instance() {
    let dir = TempDir::new().expect("temp dir");
    {
        let store = StoreService::new(dir.path());
        store.set("theme", json!("Pink")).await.expect("set");
        store
            .set("pomodorosCompleted", json!({ "value": 4 }))
            .await
            .expect("set");
    }

    let store = StoreService::new(dir.path());
    store.initialize().await.expect("initialize");

    assert_eq!(store.get("theme").await, Some(json!("Pink")));
    // The legacy wrapped shape is stored as-is; callers unwrap it on load.
    assert_eq!(
        store.get("pomodorosCompleted").await,
        Some(json!({ "value": 4 }))
    );
    assert_eq!(store.get("pomodoroDuration").await, None);
}

#[tokio::test]
async fn initialize_creates_a_missing_data_directory() {
    let dir = TempDir::new().expect("temp dir");
    let nested = dir.path().join("nested").join("tomadoro");

    let store = StoreService::new(&nested);
    store.initialize().await.expect("initialize");
    assert!(nested.exists());

    store.set("theme", json!("Dark")).await.expect("set");
    assert!(nested.join("store.json").exists());
}

#[tokio::test]
async fn corrupt_store_file_degrades_to_defaults() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("store.json"), "not json {{").expect("write");

    let store = StoreService::new(dir.path());
    store.initialize().await.expect("initialize");
    assert_eq!(store.get("theme").await, None);

    // The next write replaces the corrupt file with a readable one.
    store.set("theme", json!("Warm")).await.expect("set");
    let reopened = StoreService::new(dir.path());
    reopened.initialize().await.expect("initialize");
    assert_eq!(reopened.get("theme").await, Some(json!("Warm")));
}

#[tokio::test]
async fn write_failures_are_reported_to_the_caller() {
    let dir = TempDir::new().expect("temp dir");
    let missing = dir.path().join("never-created");

    // No initialize(): the directory does not exist, so the file write fails.
    let store = StoreService::new(&missing);
    assert!(store.set("theme", json!("Warm")).await.is_err());
}

#[tokio::test]
async fn services_with_disjoint_keys_share_one_store() {
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(StoreService::new(dir.path()));

    store.set("theme", json!("Dark")).await.expect("set");
    store.set("pomodoroDuration", json!(45)).await.expect("set");

    assert_eq!(store.get("theme").await, Some(json!("Dark")));
    assert_eq!(store.get("pomodoroDuration").await, Some(json!(45)));
}
