//! Errors surfaced to callers.
//!
//! Only two failures are hard errors: a network failure with no cached copy
//! to fall back to, and a failed manifest install. Storage write failures,
//! failed lookups and failed namespace deletions are logged and swallowed.

use shelter_backend::BackendError;
use shelter_core::{NetworkError, OriginError, RequestKey};
use thiserror::Error;

/// Error returned by the fetch entry point.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The network failed and no cached copy of the request exists.
    #[error("network request for `{key}` failed and no cached copy is available")]
    Network {
        /// Identity of the failed request.
        key: RequestKey,
        /// The transport failure.
        #[source]
        source: NetworkError,
    },
}

impl FetchError {
    /// Identity of the failed request.
    pub fn key(&self) -> &RequestKey {
        match self {
            FetchError::Network { key, .. } => key,
        }
    }
}

/// Error returned by the install and activate lifecycle hooks.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A manifest entry could not be fetched or was not a 2xx response.
    ///
    /// The whole install fails and the new version must not start serving.
    #[error("failed to install manifest entry `{url}`: {reason}")]
    ManifestInstall {
        /// Absolute URL of the failed entry.
        url: String,
        /// What went wrong.
        reason: String,
    },
    /// A manifest path could not be turned into a request.
    #[error("invalid manifest path `{0}`")]
    InvalidManifestPath(String),
    /// The static namespace could not be opened or written.
    #[error("storage failure during install: {0}")]
    Storage(#[from] BackendError),
    /// Activation was requested before a successful install.
    #[error("cache version {version} is not installed")]
    NotInstalled {
        /// Version that was asked to activate.
        version: u32,
    },
}

/// Error produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML for the configuration schema.
    #[error("invalid configuration: {0}")]
    Parse(String),
    /// An origin could not be parsed.
    #[error(transparent)]
    Origin(#[from] OriginError),
    /// A namespace purpose is empty.
    #[error("namespace purpose must not be empty ({0})")]
    EmptyNamespace(&'static str),
    /// A manifest path is not absolute.
    #[error("manifest path `{0}` must start with `/`")]
    RelativeManifestPath(String),
}
