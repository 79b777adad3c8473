//! Offload trait for background task execution.
//!
//! The interceptor returns the live response first and persists its copy
//! afterwards. [`Offload`] abstracts over how that deferred work is run.

use std::future::Future;

use smol_str::SmolStr;

use crate::key::RequestKey;

/// Trait for spawning background tasks.
///
/// Implementors should use `Arc` internally so that cloned instances share
/// the same configuration and state.
///
/// ```ignore
/// use shelter_core::Offload;
///
/// fn persist_later<O: Offload>(offload: &O, key: String) {
///     offload.spawn("persist", async move {
///         println!("persisting {}", key);
///     });
/// }
/// ```
pub trait Offload: Send + Sync + Clone {
    /// Spawn a future to be executed in the background.
    ///
    /// * `kind` - A label categorizing the task type (e.g., "persist").
    ///   Used for metrics and tracing.
    /// * `future` - The future to execute. Must be `Send + 'static` as it may
    ///   run on a different thread.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Spawn a future that writes the cache entry for `key`.
    ///
    /// Implementations may use the key to skip a write while another one for
    /// the same key is still in flight. The default runs every write.
    fn spawn_persist<F>(&self, key: &RequestKey, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let _ = key;
        self.spawn("persist", future);
    }
}

/// Offload that runs nothing in the background.
///
/// Spawned futures are dropped without being polled. Useful where deferred
/// persistence must be switched off, for example in read-only deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOffload;

impl Offload for DisabledOffload {
    fn spawn<F>(&self, _kind: impl Into<SmolStr>, _future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
    }
}
