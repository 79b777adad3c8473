use std::sync::Arc;

use async_trait::async_trait;
use shelter_core::BackendLabel;

use crate::{BackendResult, DeleteStatus};

/// A persistent string-to-string medium, the local-storage equivalent.
///
/// Every operation is total: when it returns, the write has either fully
/// happened or not at all. There are no guarantees across several keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> BackendResult<()>;

    /// Removes `key`.
    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus>;

    /// Returns the label of this store for tracing and metrics.
    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("kv")
    }
}

#[async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).delete(key).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

#[async_trait]
impl KeyValueStore for Box<dyn KeyValueStore> {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).delete(key).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}
