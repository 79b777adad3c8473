//! Fetch interceptor middleware for reqwest-middleware.

use std::sync::Arc;

use async_trait::async_trait;
use http::Extensions;
use http::header::{HeaderName, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use shelter::{FetchInterceptor, OffloadManager, ShelterConfig};
use shelter_backend::NamedCache;
use shelter_core::CacheStatus;
use tracing::debug;

use crate::convert::{fetch_request, reqwest_response};
use crate::transport::NextTransport;

/// Header carrying the cache status of every response.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

/// Routes every request of a reqwest-middleware client through a
/// [`FetchInterceptor`].
///
/// Responses carry an `X-Cache-Status` header: `MISS` when they came from
/// the network, `HIT` for a cache-first hit and `STALE` for a cached copy
/// served after a network failure. A network failure with no cached copy
/// becomes a [`reqwest_middleware::Error::Middleware`] wrapping
/// [`shelter::FetchError`].
///
/// Requests with a streaming body cannot be replayed and bypass the
/// interceptor.
pub struct ShelterMiddleware<C> {
    interceptor: FetchInterceptor<C, OffloadManager>,
}

impl<C> ShelterMiddleware<C>
where
    C: NamedCache + 'static,
{
    /// Wraps an existing interceptor.
    pub fn new(interceptor: FetchInterceptor<C, OffloadManager>) -> Self {
        Self { interceptor }
    }

    /// Creates a middleware for the version described by `config`.
    pub fn from_config(config: &ShelterConfig, cache: Arc<C>) -> Self {
        let offload = OffloadManager::new(config.offload.to_offload_config());
        Self::new(
            FetchInterceptor::with_offload(cache, config.policy(), offload)
                .with_base_origin(config.assets.origin.clone()),
        )
    }

    /// The wrapped interceptor.
    pub fn interceptor(&self) -> &FetchInterceptor<C, OffloadManager> {
        &self.interceptor
    }

    /// Waits until every background persist spawned so far has finished.
    pub async fn settle(&self) {
        self.interceptor.settle().await
    }
}

impl<C> Clone for ShelterMiddleware<C> {
    fn clone(&self) -> Self {
        Self {
            interceptor: self.interceptor.clone(),
        }
    }
}

fn status_value(status: CacheStatus) -> HeaderValue {
    match status {
        CacheStatus::Hit => HeaderValue::from_static("HIT"),
        CacheStatus::Miss => HeaderValue::from_static("MISS"),
        CacheStatus::Stale => HeaderValue::from_static("STALE"),
    }
}

#[async_trait]
impl<C> Middleware for ShelterMiddleware<C>
where
    C: NamedCache + 'static,
{
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let Some(request) = fetch_request(&req) else {
            debug!(url = %req.url(), "streaming request body, bypassing cache");
            return next.run(req, extensions).await;
        };

        let transport = NextTransport::new(next, extensions.clone());
        let mut response = self
            .interceptor
            .fetch_with(&transport, request)
            .await
            .map_err(reqwest_middleware::Error::middleware)?;

        let status = status_value(response.cache_status());
        response.headers_mut().insert(CACHE_STATUS_HEADER, status);
        Ok(reqwest_response(response))
    }
}
