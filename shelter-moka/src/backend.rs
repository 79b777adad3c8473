//! Moka named cache implementation.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use shelter_backend::{BackendResult, CacheHandle, DeleteStatus, NamedCache};
use shelter_core::{BackendLabel, CacheEntry, NamespaceName, RequestKey};
use tracing::debug;

use crate::builder::{Capacity, MokaNamedCacheBuilder};

pub(crate) type NamespaceCache = Cache<RequestKey, CacheEntry>;

/// Named cache keeping every namespace in its own Moka cache.
///
/// Cloning is cheap: clones share the same namespaces.
///
/// ```
/// use shelter_moka::MokaNamedCache;
///
/// let unbounded = MokaNamedCache::new();
/// let bounded = MokaNamedCache::builder().max_entries(1_000).build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted**; namespaces are lost on process restart.
/// - By default namespaces are unbounded and an entry only disappears with
///   its namespace. Configuring a capacity trades that guarantee for a
///   memory bound.
#[derive(Clone)]
pub struct MokaNamedCache {
    namespaces: Arc<DashMap<NamespaceName, NamespaceCache>>,
    pub(crate) capacity: Capacity,
    pub(crate) eviction_policy: Option<moka::policy::EvictionPolicy>,
    pub(crate) label: BackendLabel,
}

impl std::fmt::Debug for MokaNamedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaNamedCache")
            .field("label", &self.label)
            .field("capacity", &self.capacity)
            .field("namespaces", &self.namespaces.len())
            .finish()
    }
}

impl MokaNamedCache {
    /// Creates an unbounded named cache.
    pub fn new() -> Self {
        MokaNamedCacheBuilder::new().build()
    }

    /// Creates a new builder.
    pub fn builder() -> MokaNamedCacheBuilder {
        MokaNamedCacheBuilder::new()
    }

    pub(crate) fn from_builder(
        capacity: Capacity,
        eviction_policy: Option<moka::policy::EvictionPolicy>,
        label: BackendLabel,
    ) -> Self {
        MokaNamedCache {
            namespaces: Arc::new(DashMap::new()),
            capacity,
            eviction_policy,
            label,
        }
    }

    fn build_namespace(&self, namespace: &NamespaceName) -> NamespaceCache {
        let mut builder = Cache::builder().name(namespace.as_str());
        match self.capacity {
            Capacity::Unbounded => {}
            Capacity::Entries(max) => builder = builder.max_capacity(max),
            Capacity::Bytes(max) => {
                builder = builder.max_capacity(max).weigher(byte_weigher);
            }
        }
        if let Some(policy) = self.eviction_policy.clone() {
            builder = builder.eviction_policy(policy);
        }
        builder.build()
    }
}

impl Default for MokaNamedCache {
    fn default() -> Self {
        Self::new()
    }
}

fn byte_weigher(key: &RequestKey, entry: &CacheEntry) -> u32 {
    (key.memory_size() + entry.memory_size()).min(u32::MAX as usize) as u32
}

/// Handle to one namespace of a [`MokaNamedCache`].
#[derive(Clone, Debug)]
pub struct MokaHandle {
    namespace: NamespaceName,
    cache: NamespaceCache,
}

impl MokaHandle {
    /// Approximate number of entries in the namespace.
    ///
    /// Moka applies writes lazily; call [`MokaHandle::sync`] first for an
    /// exact figure.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Applies pending maintenance work (evictions, counters).
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl CacheHandle for MokaHandle {
    fn namespace(&self) -> &NamespaceName {
        &self.namespace
    }
}

#[async_trait]
impl NamedCache for MokaNamedCache {
    type Handle = MokaHandle;

    async fn open(&self, namespace: &NamespaceName) -> BackendResult<MokaHandle> {
        let cache = self
            .namespaces
            .entry(namespace.clone())
            .or_insert_with(|| {
                debug!(%namespace, backend = %self.label, "creating namespace");
                self.build_namespace(namespace)
            })
            .clone();
        Ok(MokaHandle {
            namespace: namespace.clone(),
            cache,
        })
    }

    async fn open_existing(&self, namespace: &NamespaceName) -> BackendResult<Option<MokaHandle>> {
        Ok(self.namespaces.get(namespace).map(|cache| MokaHandle {
            namespace: namespace.clone(),
            cache: cache.value().clone(),
        }))
    }

    async fn lookup(
        &self,
        handle: &MokaHandle,
        key: &RequestKey,
    ) -> BackendResult<Option<CacheEntry>> {
        Ok(handle.cache.get(key).await)
    }

    async fn put(
        &self,
        handle: &MokaHandle,
        key: &RequestKey,
        entry: CacheEntry,
    ) -> BackendResult<()> {
        handle.cache.insert(key.clone(), entry).await;
        Ok(())
    }

    async fn namespaces(&self) -> BackendResult<BTreeSet<NamespaceName>> {
        Ok(self
            .namespaces
            .iter()
            .map(|namespace| namespace.key().clone())
            .collect())
    }

    async fn delete(&self, namespace: &NamespaceName) -> BackendResult<DeleteStatus> {
        match self.namespaces.remove(namespace) {
            Some((_, cache)) => {
                // Detached handles keep the cache alive; empty it so they
                // cannot serve entries from a deleted namespace.
                cache.invalidate_all();
                debug!(%namespace, backend = %self.label, "namespace deleted");
                Ok(DeleteStatus::Deleted(1))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}
