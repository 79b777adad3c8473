#![doc = include_str!("../README.md")]

mod convert;
mod middleware;
mod transport;

pub use middleware::{CACHE_STATUS_HEADER, ShelterMiddleware};
pub use transport::{NextTransport, ReqwestTransport};

// Re-export common types
pub use shelter::{FetchError, FetchInterceptor, OffloadManager, PolicyTable, ShelterConfig};
pub use shelter_core::CacheStatus;
