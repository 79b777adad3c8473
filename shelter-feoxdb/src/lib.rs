#![warn(missing_docs)]
//! Persistent [`KeyValueStore`](shelter_backend::KeyValueStore) on FeOxDB.
//!
//! This is the local-storage equivalent for the fallback tier: records
//! written here survive process restarts and are independent of the named
//! response cache.

mod error;
mod store;

pub use error::FeOxDbError;
pub use store::{FeOxDbStore, FeOxDbStoreBuilder};
