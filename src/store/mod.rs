// src/store/mod.rs

//! Key/value storage port.
//!
//! Everything the quiz persists (the active user name, progress records and
//! per-filter positions) goes through [`KeyValueStore`], so the domain code
//! never knows whether it is talking to SQLite or to a map in memory.

pub mod keys;
pub mod memory;
pub mod sqlite;

use std::fmt;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Failure reported by a storage backend.
#[derive(Debug)]
pub enum StorageError {
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Backend(msg) => write!(f, "storage backend error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored, in ascending order.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Removes every key starting with `prefix` and returns how many went.
    async fn remove_prefixed(&self, prefix: &str) -> Result<usize, StorageError> {
        let doomed: Vec<String> = self
            .keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();

        for key in &doomed {
            self.remove(key).await?;
        }

        Ok(doomed.len())
    }
}
