// #![warn(missing_docs)]
//! Storage traits for the shelter offline-resilient fetch cache.
//!
//! Two storage surfaces back the two cache tiers:
//!
//! - [`NamedCache`] holds raw response snapshots ([`CacheEntry`]) grouped in
//!   independently deletable namespaces. This is the tier the interceptor
//!   reads and writes.
//! - [`KeyValueStore`] is a flat string-to-string medium. The fallback tier
//!   keeps application-shaped JSON there, so it survives even when every
//!   namespace is cleared.
//!
//! If you want to implement your own storage, you are in the right place.
//!
//! [`CacheEntry`]: shelter_core::CacheEntry
mod error;
mod kv;
mod memory;
mod named;

pub use error::BackendError;
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use named::{CacheHandle, NamedCache};

/// Result type of every storage operation.
pub type BackendResult<T> = Result<T, BackendError>;

/// Status of deleting result.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
