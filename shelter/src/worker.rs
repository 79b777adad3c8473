//! The application-facing entry points in one place.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use shelter_backend::{KeyValueStore, NamedCache};
use shelter_core::{FetchRequest, FetchResponse, Transport};
use smol_str::SmolStr;
use tokio::sync::Mutex;

use crate::config::ShelterConfig;
use crate::error::{FetchError, LifecycleError};
use crate::fallback::{LogicalKey, Recalled, StaleDataFallback};
use crate::interceptor::FetchInterceptor;
use crate::lifecycle::{ActivationReport, CacheLifecycleManager, Phase};
use crate::offload::OffloadManager;

/// An offline-resilient fetch gateway for one cache version.
///
/// Bundles a transport, the named cache, the fallback key-value store and
/// the lifecycle of the configured version.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use shelter::{LogicalKey, OfflineWorker, ShelterConfig};
/// use shelter_backend::{MemoryStore, NamedCache};
/// use shelter_core::{FetchRequest, Transport};
///
/// async fn run<T: Transport, C: NamedCache + 'static>(transport: T, cache: Arc<C>) {
///     let config = ShelterConfig::from_yaml(
///         r#"
/// version: 2
/// assets:
///   origin: https://streamlist.example.com
///   manifest: [/, /index.html, /manifest.json]
/// rules:
///   - origin: api.themoviedb.org
///     strategy: network-first
///     namespace: tmdb
/// "#,
///     )
///     .unwrap();
///     let worker = OfflineWorker::new(&config, transport, cache, MemoryStore::new());
///
///     worker.on_install().await.unwrap();
///     worker.on_activate().await.unwrap();
///
///     let request = FetchRequest::get("https://api.themoviedb.org/3/movie/popular").unwrap();
///     let movies = worker.fetch_with_policy(request).await;
///     # let _ = movies;
/// }
/// ```
pub struct OfflineWorker<T, C, S> {
    transport: T,
    interceptor: FetchInterceptor<C, OffloadManager>,
    lifecycle: Mutex<CacheLifecycleManager<C>>,
    fallback: StaleDataFallback<S>,
}

impl<T, C, S> OfflineWorker<T, C, S>
where
    T: Transport,
    C: NamedCache + 'static,
    S: KeyValueStore,
{
    /// Creates a worker for the version described by `config`.
    pub fn new(config: &ShelterConfig, transport: T, cache: Arc<C>, store: S) -> Self {
        let policy = Arc::new(config.policy());
        let offload = OffloadManager::new(config.offload.to_offload_config());
        OfflineWorker {
            transport,
            interceptor: FetchInterceptor::with_offload(cache.clone(), policy.clone(), offload)
                .with_base_origin(config.assets.origin.clone()),
            lifecycle: Mutex::new(CacheLifecycleManager::new(
                cache,
                policy,
                config.assets.origin.clone(),
                config.assets.manifest.clone(),
            )),
            fallback: StaleDataFallback::new(store),
        }
    }

    /// Stores fallback records under `prefix` followed by the logical key.
    pub fn with_fallback_prefix(mut self, prefix: impl Into<SmolStr>) -> Self {
        self.fallback = self.fallback.with_prefix(prefix);
        self
    }

    /// Sends `request` under the policy of its origin.
    ///
    /// Relative requests are resolved against the assets origin first.
    pub async fn fetch_with_policy(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.interceptor.fetch_with(&self.transport, request).await
    }

    /// Reads the last remembered value for `key`.
    pub async fn recall<V>(&self, key: &LogicalKey) -> Option<V>
    where
        V: DeserializeOwned,
    {
        self.fallback.recall(key).await
    }

    /// Overwrites the fallback record for `key`.
    pub async fn remember<V>(&self, key: &LogicalKey, value: &V)
    where
        V: Serialize + ?Sized,
    {
        self.fallback.remember(key, value).await
    }

    /// Runs an application-level remote call guarded by the fallback tier.
    pub async fn with_fallback<V, E, F, Fut>(&self, key: &LogicalKey, call: F) -> Recalled<V>
    where
        V: Serialize + DeserializeOwned,
        E: std::fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.fallback.with_fallback(key, call).await
    }

    /// Installs the static asset manifest. The version may serve requests
    /// only once this succeeded.
    pub async fn on_install(&self) -> Result<(), LifecycleError> {
        self.lifecycle.lock().await.on_install(&self.transport).await
    }

    /// Deletes every namespace of other versions.
    ///
    /// Fails with [`LifecycleError::NotInstalled`] unless
    /// [`on_install`](OfflineWorker::on_install) succeeded.
    pub async fn on_activate(&self) -> Result<ActivationReport, LifecycleError> {
        self.lifecycle.lock().await.on_activate().await
    }

    /// Current lifecycle phase of this version.
    pub async fn phase(&self) -> Phase {
        self.lifecycle.lock().await.phase()
    }

    /// Waits until every background persist spawned so far has finished.
    pub async fn settle(&self) {
        self.interceptor.settle().await
    }

    /// The interceptor behind [`fetch_with_policy`](OfflineWorker::fetch_with_policy).
    pub fn interceptor(&self) -> &FetchInterceptor<C, OffloadManager> {
        &self.interceptor
    }

    /// The fallback tier behind [`recall`](OfflineWorker::recall) and
    /// [`remember`](OfflineWorker::remember).
    pub fn fallback(&self) -> &StaleDataFallback<S> {
        &self.fallback
    }
}
