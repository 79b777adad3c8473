//! Shared helpers for shelter integration tests.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use http::{HeaderMap, StatusCode, Uri};
use shelter::{FetchRequest, FetchResponse, NetworkError, OnceBody, Transport};
use shelter_backend::{BackendError, BackendResult, DeleteStatus, KeyValueStore, NamedCache};
use shelter_core::{BackendLabel, CacheEntry, NamespaceName, RequestKey};
use shelter_moka::{MokaHandle, MokaNamedCache};

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

fn normalize(url: &str) -> String {
    url.parse::<Uri>()
        .map(|uri| uri.to_string())
        .unwrap_or_else(|_| url.to_owned())
}

#[derive(Default)]
struct StubInner {
    responses: DashMap<String, (StatusCode, String)>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

/// Scripted transport with call counting and an offline switch.
///
/// Unscripted URLs answer `404`.
#[derive(Clone, Default)]
pub struct StubTransport {
    inner: Arc<StubInner>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `url` with `status` and `body` from now on.
    pub fn respond(&self, url: &str, status: StatusCode, body: &str) -> &Self {
        self.inner
            .responses
            .insert(normalize(url), (status, body.to_owned()));
        self
    }

    /// Answers `url` with `200 OK` and `body`.
    pub fn ok(&self, url: &str, body: &str) -> &Self {
        self.respond(url, StatusCode::OK, body)
    }

    /// Makes every following call fail with a connection error, or succeed again.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of calls made so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Connect("network unreachable".into()));
        }
        let url = request.uri().to_string();
        let (status, body) = self
            .inner
            .responses
            .get(&url)
            .map(|entry| entry.value().clone())
            .unwrap_or((StatusCode::NOT_FOUND, String::new()));
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, "application/json".parse().unwrap());
        Ok(FetchResponse::new(status, headers, OnceBody::new(body)))
    }
}

/// Key-value store whose medium is always unavailable.
#[derive(Clone, Default)]
pub struct FailingStore;

#[derive(Debug, thiserror::Error)]
#[error("storage medium unavailable")]
pub struct Unavailable;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> BackendResult<Option<String>> {
        Err(BackendError::ConnectionError(Box::new(Unavailable)))
    }

    async fn set(&self, _key: &str, _value: &str) -> BackendResult<()> {
        Err(BackendError::ConnectionError(Box::new(Unavailable)))
    }

    async fn delete(&self, _key: &str) -> BackendResult<DeleteStatus> {
        Err(BackendError::ConnectionError(Box::new(Unavailable)))
    }
}

/// Moka named cache that refuses to delete some namespaces and can refuse writes.
#[derive(Clone, Default)]
pub struct FaultyCache {
    pub inner: MokaNamedCache,
    undeletable: Arc<DashMap<NamespaceName, ()>>,
    read_only: Arc<AtomicBool>,
}

impl FaultyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `delete(namespace)` fail.
    pub fn refuse_delete(&self, namespace: &str) {
        self.undeletable.insert(NamespaceName::new(namespace), ());
    }

    /// Makes every `put` fail, or succeed again.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

#[async_trait]
impl NamedCache for FaultyCache {
    type Handle = MokaHandle;

    async fn open(&self, namespace: &NamespaceName) -> BackendResult<MokaHandle> {
        self.inner.open(namespace).await
    }

    async fn open_existing(&self, namespace: &NamespaceName) -> BackendResult<Option<MokaHandle>> {
        self.inner.open_existing(namespace).await
    }

    async fn lookup(
        &self,
        handle: &MokaHandle,
        key: &RequestKey,
    ) -> BackendResult<Option<CacheEntry>> {
        self.inner.lookup(handle, key).await
    }

    async fn put(&self, handle: &MokaHandle, key: &RequestKey, entry: CacheEntry) -> BackendResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(BackendError::QuotaExceeded {
                requested: entry.payload().len(),
                limit: 0,
            });
        }
        self.inner.put(handle, key, entry).await
    }

    async fn namespaces(&self) -> BackendResult<BTreeSet<NamespaceName>> {
        self.inner.namespaces().await
    }

    async fn delete(&self, namespace: &NamespaceName) -> BackendResult<DeleteStatus> {
        if self.undeletable.contains_key(namespace) {
            return Err(BackendError::ConnectionError(Box::new(Unavailable)));
        }
        self.inner.delete(namespace).await
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("faulty")
    }
}

/// Names of every namespace of `cache`, as plain strings.
pub async fn namespace_names<C: NamedCache>(cache: &C) -> Vec<String> {
    cache
        .namespaces()
        .await
        .unwrap()
        .into_iter()
        .map(|name| name.as_str().to_owned())
        .collect()
}
