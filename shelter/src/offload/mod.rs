//! Background execution of deferred cache writes.
//!
//! Network-first responses are returned to the caller before their copy is
//! persisted. The persist runs as an offload task managed here.
//!
//! ```ignore
//! use shelter::offload::{OffloadManager, OffloadConfig};
//!
//! let manager = OffloadManager::new(OffloadConfig::default());
//! manager.spawn("persist", async {
//!     // write the response copy
//! });
//! ```

mod manager;
mod policy;

pub use manager::{OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, OffloadConfigBuilder, TimeoutPolicy};
