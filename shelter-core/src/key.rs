//! Request identity used as the key of the named cache.
//!
//! A [`RequestKey`] is the pair *method + absolute URL*, query string
//! included. Two requests that differ only in a query parameter are
//! different keys.
//!
//! ```
//! use shelter_core::RequestKey;
//!
//! let key = RequestKey::get("https://api.example.com/movies/popular?page=1");
//! assert_eq!(key.method(), "GET");
//! assert_eq!(format!("{}", key), "GET https://api.example.com/movies/popular?page=1");
//! ```
//!
//! ## Performance
//!
//! `RequestKey` wraps its data in an `Arc`, so cloning a key only bumps a
//! reference count. Keys are cloned into background persist tasks and into
//! every stored [`CacheEntry`](crate::CacheEntry).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::size_of;
use std::sync::Arc;

use http::{Method, Uri};
use smol_str::SmolStr;

#[derive(Debug, Eq, PartialEq, Hash)]
struct RequestKeyInner {
    method: SmolStr,
    url: SmolStr,
}

/// Identity of a cached request: HTTP method plus absolute URL.
#[derive(Clone, Debug)]
pub struct RequestKey {
    inner: Arc<RequestKeyInner>,
}

impl PartialEq for RequestKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for RequestKey {}

impl Hash for RequestKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl RequestKey {
    /// Creates a key from a method and a URL string.
    ///
    /// The method is normalized to upper case so `get` and `GET` produce the
    /// same key.
    pub fn new(method: impl AsRef<str>, url: impl Into<SmolStr>) -> Self {
        RequestKey {
            inner: Arc::new(RequestKeyInner {
                method: SmolStr::new(method.as_ref().to_ascii_uppercase()),
                url: url.into(),
            }),
        }
    }

    /// Shorthand for a `GET` key.
    pub fn get(url: impl Into<SmolStr>) -> Self {
        Self::new("GET", url)
    }

    /// Builds a key from typed `http` parts.
    pub fn from_parts(method: &Method, uri: &Uri) -> Self {
        Self::new(method.as_str(), uri.to_string())
    }

    /// Returns the upper-cased method.
    #[inline]
    pub fn method(&self) -> &str {
        &self.inner.method
    }

    /// Returns the absolute URL, query string included.
    #[inline]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Approximate heap and inline footprint of this key in bytes.
    ///
    /// Used by size-bounded caches to weigh entries.
    pub fn memory_size(&self) -> usize {
        let heap = |len: usize| len.saturating_sub(23);
        size_of::<Self>()
            + size_of::<RequestKeyInner>()
            + heap(self.inner.method.len())
            + heap(self.inner.url.len())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.inner.method, self.inner.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_is_normalized() {
        let lower = RequestKey::new("get", "https://api.example.com/movies/popular");
        let upper = RequestKey::get("https://api.example.com/movies/popular");
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_query_is_part_of_identity() {
        let page1 = RequestKey::get("https://api.example.com/search/movie?query=alien&page=1");
        let page2 = RequestKey::get("https://api.example.com/search/movie?query=alien&page=2");
        assert_ne!(page1, page2);
    }

    #[test]
    fn test_from_parts_matches_string_form() {
        let uri: Uri = "https://api.example.com/movie/popular?language=en-US"
            .parse()
            .unwrap();
        let key = RequestKey::from_parts(&Method::GET, &uri);
        assert_eq!(
            key,
            RequestKey::get("https://api.example.com/movie/popular?language=en-US")
        );
    }

    #[test]
    fn test_clone_shares_allocation() {
        let key = RequestKey::get("https://app.example.com/index.html");
        let clone = key.clone();
        assert!(Arc::ptr_eq(&key.inner, &clone.inner));
    }
}
