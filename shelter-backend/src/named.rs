use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use shelter_core::{BackendLabel, CacheEntry, NamespaceName, RequestKey};

use crate::{BackendResult, DeleteStatus};

/// Handle to an opened namespace.
///
/// Handles are cheap to clone and may outlive the namespace they were
/// opened for. Writes through a handle whose namespace has since been
/// deleted are silently dropped; they never resurrect the namespace.
pub trait CacheHandle: Clone + Send + Sync + 'static {
    /// Name of the namespace this handle was opened for.
    fn namespace(&self) -> &NamespaceName;
}

/// A set of named response caches keyed by request identity.
///
/// This is the browser Cache API equivalent: namespaces are created on
/// demand by [`open`](NamedCache::open), hold [`CacheEntry`] snapshots, and
/// are removed as a whole by [`delete`](NamedCache::delete). Read paths use
/// [`open_existing`](NamedCache::open_existing) so a lookup never leaves an
/// empty namespace behind.
#[async_trait]
pub trait NamedCache: Send + Sync {
    /// Handle type returned by [`open`](NamedCache::open).
    type Handle: CacheHandle;

    /// Opens `namespace`, creating it if absent.
    ///
    /// Idempotent: two handles opened for the same name observe the same
    /// entries.
    async fn open(&self, namespace: &NamespaceName) -> BackendResult<Self::Handle>;

    /// Opens `namespace` only if it already exists. Never creates it.
    async fn open_existing(&self, namespace: &NamespaceName)
    -> BackendResult<Option<Self::Handle>>;

    /// Looks up the entry stored under `key`. Has no side effects.
    async fn lookup(
        &self,
        handle: &Self::Handle,
        key: &RequestKey,
    ) -> BackendResult<Option<CacheEntry>>;

    /// Inserts `entry` under `key`, replacing any previous entry.
    async fn put(&self, handle: &Self::Handle, key: &RequestKey, entry: CacheEntry)
    -> BackendResult<()>;

    /// Lists the names of every existing namespace.
    async fn namespaces(&self) -> BackendResult<BTreeSet<NamespaceName>>;

    /// Removes `namespace` and all of its entries.
    ///
    /// Once this returns, no partially deleted state is observable: the name
    /// is no longer listed and a later `open` starts from an empty namespace.
    async fn delete(&self, namespace: &NamespaceName) -> BackendResult<DeleteStatus>;

    /// Returns the label of this cache for tracing and metrics.
    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("named-cache")
    }
}

#[async_trait]
impl<C> NamedCache for Arc<C>
where
    C: NamedCache + ?Sized,
{
    type Handle = C::Handle;

    async fn open(&self, namespace: &NamespaceName) -> BackendResult<Self::Handle> {
        (**self).open(namespace).await
    }

    async fn open_existing(
        &self,
        namespace: &NamespaceName,
    ) -> BackendResult<Option<Self::Handle>> {
        (**self).open_existing(namespace).await
    }

    async fn lookup(
        &self,
        handle: &Self::Handle,
        key: &RequestKey,
    ) -> BackendResult<Option<CacheEntry>> {
        (**self).lookup(handle, key).await
    }

    async fn put(
        &self,
        handle: &Self::Handle,
        key: &RequestKey,
        entry: CacheEntry,
    ) -> BackendResult<()> {
        (**self).put(handle, key, entry).await
    }

    async fn namespaces(&self) -> BackendResult<BTreeSet<NamespaceName>> {
        (**self).namespaces().await
    }

    async fn delete(&self, namespace: &NamespaceName) -> BackendResult<DeleteStatus> {
        (**self).delete(namespace).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}
