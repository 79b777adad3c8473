//! In-memory key-value store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use shelter_core::BackendLabel;

use crate::{BackendError, BackendResult, DeleteStatus, KeyValueStore};

/// Process-local [`KeyValueStore`] backed by a `DashMap`.
///
/// Cloning is cheap and clones share the same map. An optional quota
/// emulates the size limit of browser storage: a write that would push the
/// total size of keys and values above it fails with
/// [`BackendError::QuotaExceeded`] and leaves the store untouched.
///
/// ```
/// use shelter_backend::{KeyValueStore, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MemoryStore::new();
/// store.set("cart", "[]").await.unwrap();
/// assert_eq!(store.get("cart").await.unwrap().as_deref(), Some("[]"));
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Creates an empty, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that rejects writes beyond `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        MemoryStore {
            entries: Arc::new(DashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every key.
    pub fn clear(&self) {
        self.entries.clear();
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        if let Some(limit) = self.quota {
            let requested = self.used_bytes_without(key) + key.len() + value.len();
            if requested > limit {
                tracing::warn!(key, requested, limit, "write rejected, quota exceeded");
                return Err(BackendError::QuotaExceeded { requested, limit });
            }
        }
        tracing::trace!(key, bytes = value.len(), "stored");
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus> {
        Ok(match self.entries.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("memory")
    }
}
