#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Startup configuration, loadable from YAML.
pub mod config;

/// Error types surfaced to callers.
///
/// - [`FetchError`] for the fetch entry point
/// - [`LifecycleError`] for the install and activate hooks
/// - [`ConfigError`] for configuration loading
pub mod error;

/// Application-level fallback tier of parsed, last-known-good results.
pub mod fallback;

/// The per-request caching state machine.
pub mod interceptor;

/// Versioned install and activation of cache namespaces.
pub mod lifecycle;

/// Metrics collection.
///
/// When the `metrics` feature is enabled, this module registers counters
/// and histograms for:
/// - Requests per strategy and cache status
/// - Network and persist failures
/// - Installs and namespace cleanup
/// - Background persist tasks
pub mod metrics;

/// Background execution of deferred cache writes.
pub mod offload;

/// Per-origin routing of requests.
pub mod policy;

/// The application-facing facade.
pub mod worker;

pub use config::{AssetsConfig, OffloadSettings, ShelterConfig, TimeoutAction};
pub use error::{ConfigError, FetchError, LifecycleError};
pub use fallback::{LogicalKey, Recalled, StaleDataFallback};
pub use interceptor::FetchInterceptor;
pub use lifecycle::{ActivationReport, CacheLifecycleManager, Phase};
pub use offload::{OffloadConfig, OffloadManager, TimeoutPolicy};
pub use policy::{PolicyTable, Route};
pub use worker::OfflineWorker;

pub use shelter_core::{
    CacheEntry, CacheStatus, DisabledOffload, FetchRequest, FetchResponse, NamespaceName,
    NetworkError, Offload, OnceBody, Origin, OriginPattern, PolicyRule, RequestKey,
    ResponseSource, Strategy, Transport,
};
