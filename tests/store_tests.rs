// tests/store_tests.rs

use quiz_trainer::store::{KeyValueStore, SqliteStore};
use sqlx::sqlite::SqlitePoolOptions;

/// A fresh, migrated in-memory database. One connection, so every query
/// sees the same memory database.
async fn sqlite_store() -> SqliteStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    let store = SqliteStore::new(pool);
    store.migrate().await.expect("Failed to migrate database");
    store
}

#[tokio::test]
async fn set_overwrites_existing_value() {
    let store = sqlite_store().await;

    store.set("currentUserName", "hana").await.unwrap();
    store.set("currentUserName", "taro").await.unwrap();

    assert_eq!(store.get("currentUserName").await.unwrap().as_deref(), Some("taro"));
    assert_eq!(store.keys().await.unwrap(), vec!["currentUserName".to_string()]);
}

#[tokio::test]
async fn missing_key_reads_as_none() {
    let store = sqlite_store().await;

    assert!(store.get("quizProgress").await.unwrap().is_none());
    store.remove("quizProgress").await.unwrap();
}

#[tokio::test]
async fn remove_prefixed_only_touches_matching_keys() {
    let store = sqlite_store().await;
    store.set("quizIndex_all_all_all_sequential", "2").await.unwrap();
    store.set("quizIndex_Year1_governance_all_random", "0").await.unwrap();
    store.set("quizProgress", "{}").await.unwrap();
    // `_` must not act as a wildcard
    store.set("quizIndexX", "1").await.unwrap();

    let removed = store.remove_prefixed("quizIndex_").await.unwrap();

    assert_eq!(removed, 2);
    let mut keys = store.keys().await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["quizIndexX".to_string(), "quizProgress".to_string()]);
}
