// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{KeyValueStore, StorageError};

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remove_prefixed_only_touches_matching_keys() {
        let store = MemoryStore::new();
        store.set("quizIndex_all_all_all_sequential", "3").await.unwrap();
        store.set("quizIndex_Year1_all_all_random", "1").await.unwrap();
        store.set("quizProgress_hana", "{}").await.unwrap();

        let removed = store.remove_prefixed("quizIndex_").await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.keys().await.unwrap(), vec!["quizProgress_hana".to_string()]);
    }

    #[tokio::test]
    async fn set_overwrites_previous_value() {
        let store = MemoryStore::new();
        store.set("currentUserName", "a").await.unwrap();
        store.set("currentUserName", "b").await.unwrap();

        assert_eq!(store.get("currentUserName").await.unwrap().as_deref(), Some("b"));
        store.remove("currentUserName").await.unwrap();
        assert_eq!(store.get("currentUserName").await.unwrap(), None);
    }
}
