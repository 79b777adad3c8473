//! Builder for configuring [`MokaNamedCache`].

use moka::policy::EvictionPolicy;
use shelter_core::BackendLabel;

use crate::backend::MokaNamedCache;

/// Per-namespace capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Capacity {
    #[default]
    Unbounded,
    Entries(u64),
    Bytes(u64),
}

/// Builder for creating and configuring a [`MokaNamedCache`].
///
/// Capacity applies to each namespace separately.
///
/// ```
/// use shelter_moka::{EvictionPolicy, MokaNamedCache};
///
/// let cache = MokaNamedCache::builder()
///     .label("responses")
///     .max_bytes(32 * 1024 * 1024)
///     .eviction_policy(EvictionPolicy::lru())
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct MokaNamedCacheBuilder {
    capacity: Capacity,
    eviction_policy: Option<EvictionPolicy>,
    label: BackendLabel,
}

impl MokaNamedCacheBuilder {
    /// Creates a builder for an unbounded cache labelled `"moka"`.
    pub fn new() -> Self {
        MokaNamedCacheBuilder {
            capacity: Capacity::Unbounded,
            eviction_policy: None,
            label: BackendLabel::new_static("moka"),
        }
    }

    /// Limits each namespace to `capacity` entries.
    pub fn max_entries(mut self, capacity: u64) -> Self {
        self.capacity = Capacity::Entries(capacity);
        self
    }

    /// Limits each namespace to approximately `bytes` bytes of keys and
    /// entries.
    pub fn max_bytes(mut self, bytes: u64) -> Self {
        self.capacity = Capacity::Bytes(bytes);
        self
    }

    /// Sets the eviction policy used once a namespace is full.
    ///
    /// Moka's default is TinyLFU. Has no effect on unbounded namespaces.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Sets a custom label for this cache.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Builds the [`MokaNamedCache`].
    pub fn build(self) -> MokaNamedCache {
        MokaNamedCache::from_builder(self.capacity, self.eviction_policy, self.label)
    }
}

impl Default for MokaNamedCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}
