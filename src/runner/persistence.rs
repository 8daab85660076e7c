// src/runner/persistence.rs

//! Reads and writes of user name, progress and positions through the
//! storage port.

use crate::models::progress::ProgressRecord;
use crate::runner::filter::QuizFilter;
use crate::store::keys::{self, CURRENT_USER_NAME, INDEX_PREFIX};
use crate::store::{KeyValueStore, StorageError};

/// The last entered user name, if any.
pub async fn current_user_name(store: &dyn KeyValueStore) -> Result<Option<String>, StorageError> {
    Ok(store
        .get(CURRENT_USER_NAME)
        .await?
        .filter(|name| !name.trim().is_empty()))
}

/// Stores the trimmed name; a blank name clears it. Returns what was stored.
pub async fn set_current_user_name(
    store: &dyn KeyValueStore,
    name: &str,
) -> Result<Option<String>, StorageError> {
    let name = name.trim();
    if name.is_empty() {
        store.remove(CURRENT_USER_NAME).await?;
        Ok(None)
    } else {
        store.set(CURRENT_USER_NAME, name).await?;
        Ok(Some(name.to_string()))
    }
}

pub async fn load_progress(
    store: &dyn KeyValueStore,
    user_name: Option<&str>,
) -> Result<ProgressRecord, StorageError> {
    let key = keys::progress_key(user_name);
    Ok(match store.get(&key).await? {
        Some(raw) => ProgressRecord::from_stored(&raw),
        None => ProgressRecord::default(),
    })
}

pub async fn save_progress(
    store: &dyn KeyValueStore,
    user_name: Option<&str>,
    progress: &ProgressRecord,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(progress).map_err(|e| StorageError::Backend(e.to_string()))?;
    store.set(&keys::progress_key(user_name), &raw).await
}

/// Drops the user's progress and every remembered position.
/// Other users' progress records are left untouched.
pub async fn reset_progress(store: &dyn KeyValueStore, user_name: Option<&str>) -> Result<(), StorageError> {
    store.remove(&keys::progress_key(user_name)).await?;
    let positions = store.remove_prefixed(INDEX_PREFIX).await?;
    tracing::info!(
        "Progress reset for {} ({} saved positions cleared)",
        user_name.unwrap_or("anonymous"),
        positions
    );
    Ok(())
}

/// Saved position for a filter combination. Unparseable values read as 0.
pub async fn load_position(store: &dyn KeyValueStore, filter: &QuizFilter) -> Result<usize, StorageError> {
    Ok(store
        .get(&filter.index_key())
        .await?
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0))
}

pub async fn save_position(
    store: &dyn KeyValueStore,
    filter: &QuizFilter,
    position: usize,
) -> Result<(), StorageError> {
    store.set(&filter.index_key(), &position.to_string()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn user_name_is_trimmed_and_blank_clears() {
        let store = MemoryStore::new();

        let stored = set_current_user_name(&store, "  hana ").await.unwrap();
        assert_eq!(stored.as_deref(), Some("hana"));
        assert_eq!(current_user_name(&store).await.unwrap().as_deref(), Some("hana"));

        assert_eq!(set_current_user_name(&store, "   ").await.unwrap(), None);
        assert_eq!(current_user_name(&store).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupted_progress_is_replaced_by_empty_record() {
        let store = MemoryStore::new();
        store.set("quizProgress_hana", "{\"answered\": [").await.unwrap();

        let progress = load_progress(&store, Some("hana")).await.unwrap();

        assert_eq!(progress, ProgressRecord::default());
    }

    #[tokio::test]
    async fn reset_spares_other_users() {
        let store = MemoryStore::new();
        let mut progress = ProgressRecord::default();
        progress.record_answer("q1", 1, true);
        save_progress(&store, Some("hana"), &progress).await.unwrap();
        save_progress(&store, Some("ken"), &progress).await.unwrap();
        save_progress(&store, None, &progress).await.unwrap();
        save_position(&store, &QuizFilter::default(), 4).await.unwrap();

        reset_progress(&store, Some("hana")).await.unwrap();

        assert_eq!(store.get("quizProgress_hana").await.unwrap(), None);
        assert!(store.get("quizProgress_ken").await.unwrap().is_some());
        assert!(store.get("quizProgress").await.unwrap().is_some());
        assert_eq!(load_position(&store, &QuizFilter::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn anonymous_progress_uses_default_key() {
        let store = MemoryStore::new();
        let mut progress = ProgressRecord::default();
        progress.record_answer("q1", 0, false);

        save_progress(&store, None, &progress).await.unwrap();

        assert!(store.get("quizProgress").await.unwrap().is_some());
        assert_eq!(load_progress(&store, None).await.unwrap(), progress);
    }

    #[tokio::test]
    async fn reanswer_updates_stored_entry_in_place() {
        let store = MemoryStore::new();
        let mut progress = ProgressRecord::default();
        progress.record_answer("q1", 1, true);
        save_progress(&store, Some("hana"), &progress).await.unwrap();

        let mut reloaded = load_progress(&store, Some("hana")).await.unwrap();
        reloaded.record_answer("q1", 0, false);
        save_progress(&store, Some("hana"), &reloaded).await.unwrap();

        let stored = load_progress(&store, Some("hana")).await.unwrap();
        assert_eq!(stored.answered.len(), 1);
        assert_eq!(stored.answered[0].selected_index, 0);
        assert!(!stored.answered[0].correct);
        assert_eq!(stored.correct, 0);
        assert_eq!(stored.total, 1);
    }
}
