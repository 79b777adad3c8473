//! OffloadManager implementation for background task execution.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use shelter_core::{Offload, RequestKey};
use smol_str::SmolStr;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};

#[cfg(feature = "metrics")]
use crate::metrics::{
    OFFLOAD_TASK_DURATION, OFFLOAD_TASKS_ACTIVE, OFFLOAD_TASKS_COMPLETED,
    OFFLOAD_TASKS_DEDUPLICATED, OFFLOAD_TASKS_SPAWNED, OFFLOAD_TASKS_TIMEOUT,
};

/// Key for identifying offloaded tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OffloadKey {
    /// Persist of the entry stored under a request key.
    Persist(RequestKey),
    /// Auto-generated key with a kind prefix.
    Generated {
        /// Kind of the task (e.g., "persist", "cleanup").
        kind: SmolStr,
        /// Unique identifier within the kind.
        id: u64,
    },
}

impl OffloadKey {
    /// Returns the key type for metrics labels.
    pub fn key_type(&self) -> SmolStr {
        match self {
            Self::Persist(_) => SmolStr::new_static("persist"),
            Self::Generated { kind, .. } => kind.clone(),
        }
    }
}

impl From<RequestKey> for OffloadKey {
    fn from(key: RequestKey) -> Self {
        Self::Persist(key)
    }
}

#[derive(Debug)]
struct OffloadHandle {
    id: u64,
    handle: JoinHandle<()>,
}

impl OffloadHandle {
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[derive(Debug)]
struct OffloadManagerInner {
    config: OffloadConfig,
    tasks: DashMap<OffloadKey, OffloadHandle>,
    key_counter: AtomicU64,
}

/// Runs deferred cache writes on the tokio runtime.
///
/// Every task is tracked until it finishes so callers can wait for
/// outstanding persists with [`wait_all`](OffloadManager::wait_all).
/// Cloned managers share the same task set.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    inner: Arc<OffloadManagerInner>,
}

impl OffloadManager {
    /// Create a new OffloadManager with the given configuration.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            inner: Arc::new(OffloadManagerInner {
                config,
                tasks: DashMap::new(),
                key_counter: AtomicU64::new(0),
            }),
        }
    }

    /// Create a new OffloadManager with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(OffloadConfig::default())
    }

    /// Configuration this manager was created with.
    pub fn config(&self) -> &OffloadConfig {
        &self.inner.config
    }

    fn next_key(&self, kind: impl Into<SmolStr>) -> OffloadKey {
        let id = self.inner.key_counter.fetch_add(1, Ordering::Relaxed);
        OffloadKey::Generated {
            kind: kind.into(),
            id,
        }
    }

    /// Spawn a task with auto-generated key and specified kind.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> OffloadKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = self.next_key(kind);
        self.track(key.clone(), task);
        key
    }

    /// Spawn a task with a specific key.
    ///
    /// With deduplication enabled a new task aborts the one with the same key
    /// still in flight, so the latest task wins. Without it every task runs
    /// and the key is only used as the task kind.
    ///
    /// Returns `true` if an in-flight task was aborted in favour of this one.
    pub fn spawn_with_key<K, F>(&self, key: K, task: F) -> bool
    where
        K: Into<OffloadKey>,
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();

        if !self.inner.config.deduplicate {
            let key = self.next_key(key.key_type());
            self.track(key, task);
            return false;
        }

        let superseded = match self.inner.tasks.remove(&key) {
            Some((_, previous)) if !previous.is_finished() => {
                previous.handle.abort();
                debug!(?key, "In-flight task superseded by a newer one");
                Self::record_superseded(&key.key_type());
                true
            }
            _ => false,
        };

        self.track(key, task);
        superseded
    }

    /// Get the number of currently active tasks.
    pub fn active_task_count(&self) -> usize {
        self.inner.tasks.iter().filter(|e| !e.is_finished()).count()
    }

    /// Clean up finished task handles.
    pub fn cleanup_finished(&self) {
        self.inner.tasks.retain(|_, handle| !handle.is_finished());
    }

    /// Check if a task with the given key is in flight.
    pub fn is_in_flight(&self, key: &OffloadKey) -> bool {
        self.inner.tasks.get(key).is_some_and(|h| !h.is_finished())
    }

    /// Wait for all currently tracked tasks to complete.
    ///
    /// Yields to the runtime between checks so tracked tasks can progress
    /// even on a current-thread runtime.
    pub async fn wait_all(&self) {
        loop {
            self.cleanup_finished();
            if self.inner.tasks.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Wait for all tasks with a timeout.
    ///
    /// Returns `true` if all tasks completed within the timeout.
    pub async fn wait_all_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_all()).await.is_ok()
    }

    fn track<F>(&self, key: OffloadKey, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        #[cfg(feature = "metrics")]
        {
            let key_type = key.key_type();
            metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "key_type" => key_type.to_string())
                .increment(1);
            metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "key_type" => key_type.to_string())
                .increment(1.0);
        }

        let handle = self.spawn_inner(task, key.clone());
        self.inner.tasks.insert(key, handle);
    }

    fn spawn_inner<F>(&self, task: F, key: OffloadKey) -> OffloadHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.inner.key_counter.fetch_add(1, Ordering::Relaxed);
        let timeout_policy = self.inner.config.timeout_policy.clone();
        let inner = self.inner.clone();
        let key_type = key.key_type();

        let span = info_span!(
            "offload_task",
            key_type = %key_type,
            key = ?key,
        );

        let handle = tokio::spawn(
            async move {
                let start = Instant::now();
                match timeout_policy {
                    TimeoutPolicy::None => {
                        task.await;
                        Self::record_completion(start, &key_type);
                    }
                    TimeoutPolicy::Cancel(duration) => {
                        match tokio::time::timeout(duration, task).await {
                            Ok(()) => Self::record_completion(start, &key_type),
                            Err(_) => {
                                warn!(?key, "Offload task cancelled due to timeout");
                                Self::record_timeout(start, &key_type);
                            }
                        }
                    }
                    TimeoutPolicy::Warn(duration) => {
                        task.await;
                        let elapsed = start.elapsed();
                        if elapsed > duration {
                            warn!(
                                ?key,
                                elapsed_ms = elapsed.as_millis(),
                                threshold_ms = duration.as_millis(),
                                "Offload task exceeded timeout threshold"
                            );
                        }
                        Self::record_completion(start, &key_type);
                    }
                }
                // A newer task may already own this key.
                inner.tasks.remove_if(&key, |_, handle| handle.id == id);
            }
            .instrument(span),
        );

        OffloadHandle { id, handle }
    }

    #[cfg(feature = "metrics")]
    fn record_completion(start: Instant, key_type: &SmolStr) {
        let duration = start.elapsed().as_secs_f64();
        metrics::counter!(*OFFLOAD_TASKS_COMPLETED, "key_type" => key_type.to_string())
            .increment(1);
        metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "key_type" => key_type.to_string()).decrement(1.0);
        metrics::histogram!(*OFFLOAD_TASK_DURATION, "key_type" => key_type.to_string())
            .record(duration);
    }

    #[cfg(feature = "metrics")]
    fn record_timeout(start: Instant, key_type: &SmolStr) {
        let duration = start.elapsed().as_secs_f64();
        metrics::counter!(*OFFLOAD_TASKS_TIMEOUT, "key_type" => key_type.to_string()).increment(1);
        metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "key_type" => key_type.to_string()).decrement(1.0);
        metrics::histogram!(*OFFLOAD_TASK_DURATION, "key_type" => key_type.to_string())
            .record(duration);
    }

    #[cfg(feature = "metrics")]
    fn record_superseded(key_type: &SmolStr) {
        metrics::counter!(*OFFLOAD_TASKS_DEDUPLICATED, "key_type" => key_type.to_string())
            .increment(1);
        metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "key_type" => key_type.to_string()).decrement(1.0);
    }

    #[cfg(not(feature = "metrics"))]
    #[inline]
    fn record_superseded(_key_type: &SmolStr) {}

    #[cfg(not(feature = "metrics"))]
    #[inline]
    fn record_completion(_start: Instant, _key_type: &SmolStr) {}

    #[cfg(not(feature = "metrics"))]
    #[inline]
    fn record_timeout(_start: Instant, _key_type: &SmolStr) {}
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }

    fn spawn_persist<F>(&self, key: &RequestKey, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn_with_key(key.clone(), future);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn test_wait_all_drains_tasks() {
        let manager = OffloadManager::with_defaults();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let counter = counter.clone();
            manager.spawn("persist", async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        manager.wait_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 8);
        assert_eq!(manager.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_same_key_runs_twice_without_deduplication() {
        let manager = OffloadManager::with_defaults();
        let counter = Arc::new(AtomicUsize::new(0));
        let key = RequestKey::get("https://api.example.com/movies/popular");
        for _ in 0..2 {
            let counter = counter.clone();
            assert!(!manager.spawn_with_key(key.clone(), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        manager.wait_all().await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_deduplication_keeps_latest_task() {
        let manager = OffloadManager::new(OffloadConfig::builder().deduplicate(true).build());
        let key = RequestKey::get("https://api.example.com/movies/popular");
        let written = Arc::new(std::sync::Mutex::new(Vec::new()));
        let (release, wait) = oneshot::channel::<()>();

        let older = written.clone();
        assert!(!manager.spawn_with_key(key.clone(), async move {
            let _ = wait.await;
            older.lock().unwrap().push("older");
        }));
        let newer = written.clone();
        assert!(manager.spawn_with_key(key.clone(), async move {
            newer.lock().unwrap().push("newer");
        }));

        let _ = release.send(());
        manager.wait_all().await;
        assert_eq!(*written.lock().unwrap(), vec!["newer"]);
        assert!(!manager.is_in_flight(&OffloadKey::Persist(key)));
    }

    #[tokio::test]
    async fn test_cancel_policy_stops_slow_task() {
        let manager = OffloadManager::new(
            OffloadConfig::builder()
                .cancel_after(Duration::from_millis(10))
                .build(),
        );
        let finished = Arc::new(AtomicUsize::new(0));
        let flag = finished.clone();
        manager.spawn("persist", async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        });
        assert!(manager.wait_all_timeout(Duration::from_secs(2)).await);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
