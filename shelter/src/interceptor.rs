//! The per-request caching state machine.
//!
//! Every request is routed by origin to one of two strategies:
//!
//! ```text
//! network-first:  fetch ──ok──> tee ──> live response to caller
//!                   │                └─> copy persisted in background
//!                   └─transport error──> lookup ──hit──> stale copy
//!                                              └─miss─> FetchError::Network
//!
//! cache-first:    lookup ──hit──> cached copy (no network call)
//!                   └─miss──> fetch ──> response as is (not persisted)
//! ```
//!
//! A 4xx or 5xx response is a successful fetch. Only transport failures
//! trigger the fallback.

use std::sync::Arc;
use std::time::Instant;

use shelter_backend::NamedCache;
use shelter_core::{
    CacheEntry, CacheStatus, FetchRequest, FetchResponse, NamespaceName, Offload, Origin,
    RequestKey, Strategy, Transport,
};
use tracing::{Instrument, debug, info_span, warn};

use crate::error::FetchError;
use crate::metrics;
use crate::offload::OffloadManager;
use crate::policy::{PolicyTable, Route};

/// Gateway applying the per-origin caching policy to outbound requests.
///
/// The interceptor does not own a transport: the caller passes one to
/// [`fetch_with`](FetchInterceptor::fetch_with), which lets HTTP client
/// middleware route its own downstream through the interceptor.
///
/// Relative requests are resolved against the
/// [base origin](FetchInterceptor::with_base_origin) when one is set, so
/// `/index.html` is keyed and routed like the installed absolute URL.
pub struct FetchInterceptor<C, O = OffloadManager> {
    cache: Arc<C>,
    policy: Arc<PolicyTable>,
    offload: O,
    base: Option<Origin>,
}

impl<C> FetchInterceptor<C, OffloadManager>
where
    C: NamedCache + 'static,
{
    /// Creates an interceptor persisting through a default [`OffloadManager`].
    pub fn new(cache: Arc<C>, policy: impl Into<Arc<PolicyTable>>) -> Self {
        Self::with_offload(cache, policy, OffloadManager::default())
    }

    /// Waits until every background persist spawned so far has finished.
    pub async fn settle(&self) {
        self.offload.wait_all().await;
    }
}

impl<C, O> FetchInterceptor<C, O>
where
    C: NamedCache + 'static,
    O: Offload,
{
    /// Creates an interceptor with a custom background executor.
    pub fn with_offload(cache: Arc<C>, policy: impl Into<Arc<PolicyTable>>, offload: O) -> Self {
        FetchInterceptor {
            cache,
            policy: policy.into(),
            offload,
            base: None,
        }
    }

    /// Resolves relative requests against `origin` before routing them.
    pub fn with_base_origin(mut self, origin: Origin) -> Self {
        self.base = Some(origin);
        self
    }

    /// Origin relative requests are resolved against, if any.
    pub fn base_origin(&self) -> Option<&Origin> {
        self.base.as_ref()
    }

    /// Routing table in use.
    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Named cache in use.
    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Background executor in use.
    pub fn offload(&self) -> &O {
        &self.offload
    }

    /// Sends `request` through `transport` under the policy of its origin.
    ///
    /// Fails only when the network failed and there is no cached copy to
    /// serve instead.
    pub async fn fetch_with<T>(
        &self,
        transport: &T,
        request: FetchRequest,
    ) -> Result<FetchResponse, FetchError>
    where
        T: Transport + ?Sized,
    {
        let request = match &self.base {
            Some(base) => request.resolve_against(base),
            None => request,
        };
        let key = request.key();
        let route = self.policy.route(request.origin().as_ref());
        let span = info_span!(
            "shelter.fetch",
            key = %key,
            strategy = %route.strategy,
            namespace = %route.namespace,
        );

        async move {
            let start = Instant::now();
            let Route {
                strategy,
                namespace,
            } = route;
            let result = match strategy {
                Strategy::NetworkFirst => {
                    self.network_first(transport, request, key, namespace).await
                }
                Strategy::CacheFirst => self.cache_first(transport, request, key, namespace).await,
            };
            if let Ok(response) = &result {
                metrics::record_request(strategy, response.cache_status(), start.elapsed());
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn network_first<T>(
        &self,
        transport: &T,
        request: FetchRequest,
        key: RequestKey,
        namespace: NamespaceName,
    ) -> Result<FetchResponse, FetchError>
    where
        T: Transport + ?Sized,
    {
        match transport.fetch(request).await {
            Ok(response) => {
                debug!(status = %response.status(), "network responded, persisting copy");
                // The copy must be split off before the caller can read the body.
                let (live, copy) = response.tee();
                self.persist(namespace, key.clone(), copy.into_entry(key, Strategy::NetworkFirst));
                Ok(live)
            }
            Err(error) => {
                metrics::record_network_failure(Strategy::NetworkFirst);
                match self.lookup(&namespace, &key).await {
                    Some(entry) => {
                        debug!(%error, captured_at = %entry.capture_time(), "network failed, serving cached copy");
                        Ok(FetchResponse::from_entry(
                            entry,
                            CacheStatus::Stale,
                            namespace,
                        ))
                    }
                    None => {
                        debug!(%error, "network failed, no cached copy");
                        Err(FetchError::Network { key, source: error })
                    }
                }
            }
        }
    }

    async fn cache_first<T>(
        &self,
        transport: &T,
        request: FetchRequest,
        key: RequestKey,
        namespace: NamespaceName,
    ) -> Result<FetchResponse, FetchError>
    where
        T: Transport + ?Sized,
    {
        if let Some(entry) = self.lookup(&namespace, &key).await {
            debug!("cache hit");
            return Ok(FetchResponse::from_entry(entry, CacheStatus::Hit, namespace));
        }
        debug!("cache miss, asking network");
        transport.fetch(request).await.map_err(|source| {
            metrics::record_network_failure(Strategy::CacheFirst);
            FetchError::Network { key, source }
        })
    }

    /// Looks `key` up in `namespace`. Storage errors count as a miss.
    ///
    /// A missing namespace is a miss and is not created.
    async fn lookup(&self, namespace: &NamespaceName, key: &RequestKey) -> Option<CacheEntry> {
        let result = async {
            match self.cache.open_existing(namespace).await? {
                Some(handle) => self.cache.lookup(&handle, key).await,
                None => Ok(None),
            }
        }
        .await;
        result.unwrap_or_else(|error| {
            warn!(%error, backend = %self.cache.label(), "cache lookup failed, treating as miss");
            None
        })
    }

    fn persist(&self, namespace: NamespaceName, key: RequestKey, entry: CacheEntry) {
        let cache = self.cache.clone();
        let task_key = key.clone();
        self.offload.spawn_persist(&task_key, async move {
            let result = async {
                let handle = cache.open(&namespace).await?;
                cache.put(&handle, &key, entry).await
            }
            .await;
            match result {
                Ok(()) => debug!(%key, %namespace, "response copy persisted"),
                Err(error) => {
                    let backend = cache.label();
                    warn!(%error, %key, %namespace, %backend, "failed to persist response copy");
                    metrics::record_persist_failure(backend.as_str());
                }
            }
        });
    }
}

impl<C, O> Clone for FetchInterceptor<C, O>
where
    O: Clone,
{
    fn clone(&self) -> Self {
        FetchInterceptor {
            cache: self.cache.clone(),
            policy: self.policy.clone(),
            offload: self.offload.clone(),
            base: self.base.clone(),
        }
    }
}
