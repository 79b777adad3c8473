//! Error types for storage operations.

use thiserror::Error;

/// Error type for storage operations.
///
/// Callers on the request path never propagate these: a failed lookup is
/// treated as a miss and a failed write is logged and dropped.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal storage error, state or computation error.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// The storage medium could not be reached.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// The write does not fit in the remaining storage quota.
    #[error("storage quota exceeded: {requested} bytes requested, {limit} bytes allowed")]
    QuotaExceeded {
        /// Total size the store would have after the write.
        requested: usize,
        /// Configured quota.
        limit: usize,
    },
}

impl BackendError {
    /// Wraps any error as an [`BackendError::InternalError`].
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BackendError::InternalError(Box::new(error))
    }
}
