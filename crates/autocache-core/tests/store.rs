use autocache_core::{InMemoryStore, Store};
use serde_json::json;

// ---------------------------------------------------------------------------
// Basic contract
// ---------------------------------------------------------------------------

#[tokio::test]
async fn set_then_get_returns_stored_value() {
    let store = InMemoryStore::new();
    store
        .set("theme", json!({"mode": "dark", "contrast": 7}))
        .await
        .unwrap();

    let value = store
        .get("theme")
        .await
        .unwrap()
        .expect("entry should exist");

    assert_eq!(value, json!({"mode": "dark", "contrast": 7}));
}

#[tokio::test]
async fn get_never_written_key_returns_none() {
    let store = InMemoryStore::new();
    let result = store.get("missing").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn set_overwrites_previous_value() {
    let store = InMemoryStore::new();
    store.set("k", json!("v1")).await.unwrap();
    store.set("k", json!("v2")).await.unwrap();

    let value = store.get("k").await.unwrap().unwrap();
    assert_eq!(value, json!("v2"));
}

#[tokio::test]
async fn nested_values_survive_the_round_trip() {
    let store = InMemoryStore::new();
    let value = json!({
        "id": 42,
        "tags": ["a", "b", "c"],
        "nested": { "flag": true, "ratio": 0.5, "none": null },
    });
    store.set("compound", value.clone()).await.unwrap();

    let read_back = store.get("compound").await.unwrap().unwrap();
    assert_eq!(read_back, value);
}

// ---------------------------------------------------------------------------
// destroy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn destroy_removes_entry_and_reports_it() {
    let store = InMemoryStore::new();
    store.set("k", json!(42)).await.unwrap();

    let removed = store.destroy("k").await.unwrap();
    assert!(removed);
    assert!(store.get("k").await.unwrap().is_none());
}

#[tokio::test]
async fn destroy_never_set_key_returns_false() {
    let store = InMemoryStore::new();
    let removed = store.destroy("ghost").await.unwrap();
    assert!(!removed);
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clear_empties_the_store() {
    let store = InMemoryStore::new();
    for key in ["a", "b", "c", "d"] {
        store.set(key, json!(key)).await.unwrap();
    }

    store.clear().await.unwrap();

    for key in ["a", "b", "c", "d"] {
        assert!(store.get(key).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn clear_on_empty_store_succeeds() {
    let store = InMemoryStore::new();
    store.clear().await.unwrap();
}
