//! Responses returned by the interceptor.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::body::{BodyError, OnceBody};
use crate::entry::CacheEntry;
use crate::key::RequestKey;
use crate::namespace::NamespaceName;
use crate::strategy::Strategy;

/// How a response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// Cache hit - the cached copy was served without a network call.
    Hit,
    /// Cache miss - the response came from the network.
    #[default]
    Miss,
    /// Stale data - the network failed and a previously cached copy was served.
    Stale,
}

impl CacheStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
        }
    }
}

/// Where the response came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResponseSource {
    /// The network transport.
    #[default]
    Network,
    /// A namespace of the named cache.
    Namespace(NamespaceName),
}

impl ResponseSource {
    /// Returns the source as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Namespace(name) => name.as_str(),
        }
    }
}

/// A response with a single-use body.
///
/// `FetchResponse` is not `Clone`. Use [`FetchResponse::tee`] to obtain a
/// second, independent response before reading the body.
pub struct FetchResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: OnceBody,
    cache_status: CacheStatus,
    source: ResponseSource,
    captured_at: Option<DateTime<Utc>>,
}

impl FetchResponse {
    /// Creates a response freshly received from the network.
    pub fn new(status: StatusCode, headers: HeaderMap, body: OnceBody) -> Self {
        FetchResponse {
            status,
            headers,
            body,
            cache_status: CacheStatus::Miss,
            source: ResponseSource::Network,
            captured_at: None,
        }
    }

    /// Rebuilds a response from a cached entry.
    pub fn from_entry(entry: CacheEntry, status: CacheStatus, namespace: NamespaceName) -> Self {
        let captured_at = entry.capture_time();
        let response_status = entry.status();
        let headers = entry.headers().clone();
        let payload = entry.payload().clone();
        FetchResponse {
            status: response_status,
            headers,
            body: OnceBody::new(payload),
            cache_status: status,
            source: ResponseSource::Namespace(namespace),
            captured_at: Some(captured_at),
        }
    }

    /// Splits this response into two responses with independent bodies.
    pub fn tee(self) -> (FetchResponse, FetchResponse) {
        let (live, copy) = self.body.tee();
        let duplicate = FetchResponse {
            status: self.status,
            headers: self.headers.clone(),
            body: copy,
            cache_status: self.cache_status,
            source: self.source.clone(),
            captured_at: self.captured_at,
        };
        (
            FetchResponse {
                body: live,
                ..self
            },
            duplicate,
        )
    }

    /// Consumes the response and captures it as a cache entry.
    pub fn into_entry(self, key: RequestKey, strategy: Strategy) -> CacheEntry {
        CacheEntry::new(
            key,
            self.status,
            self.headers,
            self.body.into_bytes(),
            strategy,
        )
    }

    /// Response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// How this response was produced.
    pub fn cache_status(&self) -> CacheStatus {
        self.cache_status
    }

    /// Where this response came from.
    pub fn source(&self) -> &ResponseSource {
        &self.source
    }

    /// Capture time of the cached copy, `None` for network responses.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    /// Consumes the response and returns its parts.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, OnceBody) {
        (self.status, self.headers, self.body)
    }

    /// Consumes the response and returns the raw payload.
    pub fn bytes(self) -> Bytes {
        self.body.into_bytes()
    }

    /// Consumes the response and decodes the payload as UTF-8 text.
    pub fn text(self) -> Result<String, BodyError> {
        self.body.text()
    }

    /// Consumes the response and decodes the payload as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, BodyError> {
        self.body.json()
    }
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("cache_status", &self.cache_status)
            .field("source", &self.source)
            .field("body", &self.body)
            .finish()
    }
}
