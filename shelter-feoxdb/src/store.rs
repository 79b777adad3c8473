use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use feoxdb::{FeoxError, FeoxStore};
use shelter_backend::{BackendError, BackendResult, DeleteStatus, KeyValueStore};
use shelter_core::BackendLabel;

use crate::FeOxDbError;

/// Disk-backed key-value store using FeOxDB.
///
/// Use this when fallback records must survive restarts. For tests and
/// short-lived processes, `shelter_backend::MemoryStore` is enough.
///
/// ```no_run
/// use shelter_feoxdb::FeOxDbStore;
///
/// let store = FeOxDbStore::builder()
///     .path("/var/lib/myapp/fallback")
///     .max_file_size(64 * 1024 * 1024)
///     .build()?;
/// # Ok::<(), shelter_feoxdb::FeOxDbError>(())
/// ```
///
/// Cloning is cheap: clones share the same underlying database.
#[derive(Clone)]
pub struct FeOxDbStore {
    store: Arc<FeoxStore>,
    label: BackendLabel,
}

impl std::fmt::Debug for FeOxDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeOxDbStore")
            .field("label", &self.label)
            .finish()
    }
}

impl FeOxDbStore {
    /// Starts building a new store.
    pub fn builder() -> FeOxDbStoreBuilder {
        FeOxDbStoreBuilder::default()
    }

    /// Memory-only store. Data is lost when dropped.
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        FeOxDbStoreBuilder::default().build()
    }

    /// Forces pending writes to disk.
    ///
    /// FeOxDB buffers writes and flushes them periodically. Call this when a
    /// record must be durable before proceeding. No-op in memory-only mode.
    pub fn flush(&self) {
        self.store.flush();
    }
}

/// Builder for [`FeOxDbStore`].
#[derive(Debug)]
pub struct FeOxDbStoreBuilder {
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    label: BackendLabel,
}

impl Default for FeOxDbStoreBuilder {
    fn default() -> Self {
        FeOxDbStoreBuilder {
            path: None,
            max_file_size: None,
            max_memory: None,
            label: BackendLabel::new_static("feoxdb"),
        }
    }
}

impl FeOxDbStoreBuilder {
    /// Enables persistent storage at the given path.
    ///
    /// Without this, data lives only in memory. If the path is a directory,
    /// `fallback.db` is created inside it. Missing parent directories are
    /// created.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Caps the size of the database file.
    ///
    /// Writes fail once the file is full; the fallback tier logs and ignores
    /// such failures.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Limits RAM usage.
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Identifies this store in tracing and metrics.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Opens the store.
    ///
    /// Fails if the database file can't be opened or created.
    pub fn build(self) -> Result<FeOxDbStore, FeOxDbError> {
        let mut builder = FeoxStore::builder();

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push("fallback.db");
            } else if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            builder = builder.device_path(path.to_string_lossy().to_string());
        }

        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }

        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }

        Ok(FeOxDbStore {
            store: Arc::new(builder.build()?),
            label: self.label,
        })
    }
}

#[async_trait]
impl KeyValueStore for FeOxDbStore {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || match store.get(&key) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(BackendError::internal),
            Err(FeoxError::KeyNotFound) => Ok(None),
            Err(e) => Err(BackendError::internal(e)),
        })
        .await
        .map_err(BackendError::internal)?
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let value = value.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || {
            store
                .insert(&key, &value)
                .map_err(BackendError::internal)?;
            Ok(())
        })
        .await
        .map_err(BackendError::internal)?
    }

    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || {
            if store.contains_key(&key) {
                store.delete(&key).map_err(BackendError::internal)?;
                Ok(DeleteStatus::Deleted(1))
            } else {
                Ok(DeleteStatus::Missing)
            }
        })
        .await
        .map_err(BackendError::internal)?
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}
