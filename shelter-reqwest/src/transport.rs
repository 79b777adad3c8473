//! Transports backed by reqwest.

use async_trait::async_trait;
use http::Extensions;
use reqwest_middleware::Next;
use shelter_core::{FetchRequest, FetchResponse, NetworkError, Transport};

use crate::convert::{fetch_response, middleware_error, network_error, reqwest_request};

/// Transport sending requests with a `reqwest::Client`.
///
/// Timeouts configured on the client surface as
/// [`NetworkError::Timeout`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The wrapped client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError> {
        let request = reqwest_request(request)?;
        let response = self.client.execute(request).await.map_err(network_error)?;
        fetch_response(response).await
    }
}

/// Transport bridging reqwest-middleware's `Next<'a>` to [`Transport`].
///
/// Each call runs the rest of the middleware chain with its own copy of the
/// request extensions.
pub struct NextTransport<'a> {
    next: Next<'a>,
    extensions: Extensions,
}

impl<'a> NextTransport<'a> {
    /// Create a new transport over the remaining middleware chain.
    pub fn new(next: Next<'a>, extensions: Extensions) -> Self {
        Self { next, extensions }
    }
}

#[async_trait]
impl<'a> Transport for NextTransport<'a> {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError> {
        let request = reqwest_request(request)?;
        let mut extensions = self.extensions.clone();
        let response = self
            .next
            .clone()
            .run(request, &mut extensions)
            .await
            .map_err(middleware_error)?;
        fetch_response(response).await
    }
}
