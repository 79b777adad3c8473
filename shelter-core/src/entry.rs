//! Stored copies of network responses.

use std::mem::size_of;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};

use crate::key::RequestKey;
use crate::strategy::Strategy;

/// An immutable snapshot of a response, stored under its [`RequestKey`].
///
/// Entries are never updated in place: a newer response for the same key
/// replaces the whole entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    key: RequestKey,
    status: StatusCode,
    headers: HeaderMap,
    payload: Bytes,
    captured_at: DateTime<Utc>,
    strategy: Strategy,
}

impl CacheEntry {
    /// Captures an entry stamped with the current time.
    pub fn new(
        key: RequestKey,
        status: StatusCode,
        headers: HeaderMap,
        payload: Bytes,
        strategy: Strategy,
    ) -> Self {
        Self::captured_at(key, status, headers, payload, strategy, Utc::now())
    }

    /// Captures an entry with an explicit capture time.
    pub fn captured_at(
        key: RequestKey,
        status: StatusCode,
        headers: HeaderMap,
        payload: Bytes,
        strategy: Strategy,
        captured_at: DateTime<Utc>,
    ) -> Self {
        CacheEntry {
            key,
            status,
            headers,
            payload,
            captured_at,
            strategy,
        }
    }

    /// Key this entry was stored under.
    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    /// Status code of the captured response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers of the captured response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw payload of the captured response.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// When the response was captured.
    pub fn capture_time(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Strategy of the rule that produced this entry.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Time elapsed since capture.
    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.captured_at)
    }

    /// Approximate footprint of this entry in bytes.
    pub fn memory_size(&self) -> usize {
        let headers: usize = self
            .headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        size_of::<Self>() + self.key.memory_size() + headers + self.payload.len()
    }
}
