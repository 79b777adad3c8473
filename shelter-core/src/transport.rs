//! The network transport consumed by the interceptor.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::request::FetchRequest;
use crate::response::FetchResponse;

/// Boxed error source carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A transport-level failure.
///
/// Only failures to obtain *any* response belong here. A response with a
/// 4xx or 5xx status is a successful transport call.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,
    /// The remote host could not be reached (DNS, refused connection, offline).
    #[error("connection failed: {0}")]
    Connect(#[source] BoxError),
    /// Any other transport failure, including a body that could not be read.
    #[error("transport failed: {0}")]
    Transport(#[source] BoxError),
    /// The request could not be expressed on this transport.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Capability to send a request over the network.
///
/// Timeouts are the transport's responsibility: an implementation reports
/// them as [`NetworkError::Timeout`].
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use shelter_core::{FetchRequest, FetchResponse, NetworkError, OnceBody, Transport};
///
/// struct Offline;
///
/// #[async_trait]
/// impl Transport for Offline {
///     async fn fetch(&self, _request: FetchRequest) -> Result<FetchResponse, NetworkError> {
///         Err(NetworkError::Connect("network unreachable".into()))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and waits for a buffered response.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError> {
        (**self).fetch(request).await
    }
}
