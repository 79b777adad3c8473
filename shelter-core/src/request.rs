//! Outbound requests as seen by the interceptor.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::uri::InvalidUri;
use http::{HeaderMap, Method, Uri};

use crate::key::RequestKey;
use crate::origin::Origin;

/// An outbound request issued by the application.
///
/// ```
/// use shelter_core::FetchRequest;
///
/// let request = FetchRequest::get("https://api.themoviedb.org/3/movie/popular?page=1").unwrap();
/// assert_eq!(request.origin().unwrap().host(), "api.themoviedb.org");
/// assert_eq!(
///     request.key().to_string(),
///     "GET https://api.themoviedb.org/3/movie/popular?page=1"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl FetchRequest {
    /// Creates a request without headers or body.
    pub fn new(method: Method, uri: Uri) -> Self {
        FetchRequest {
            method,
            uri,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Parses `uri` and creates a `GET` request for it.
    pub fn get(uri: &str) -> Result<Self, InvalidUri> {
        Ok(Self::new(Method::GET, uri.parse()?))
    }

    /// Adds a header, replacing any previous value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Makes a relative request absolute by resolving it against `base`.
    ///
    /// Only origin-relative requests (`/path?query`) are resolved; anything
    /// with a scheme or an authority is returned unchanged.
    ///
    /// ```
    /// use shelter_core::{FetchRequest, Origin};
    ///
    /// let app = Origin::parse("https://app.example.com").unwrap();
    /// let request = FetchRequest::get("/index.html?v=2").unwrap().resolve_against(&app);
    /// assert_eq!(request.key().to_string(), "GET https://app.example.com/index.html?v=2");
    /// ```
    pub fn resolve_against(mut self, base: &Origin) -> Self {
        if self.uri.scheme().is_some() || self.uri.authority().is_some() {
            return self;
        }
        let path = self
            .uri
            .path_and_query()
            .map(|path| path.as_str())
            .unwrap_or("/");
        if let Ok(uri) = base.join(path).parse::<Uri>() {
            self.uri = uri;
        }
        self
    }

    /// The cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::from_parts(&self.method, &self.uri)
    }

    /// The origin this request is sent to, if the URI is absolute.
    pub fn origin(&self) -> Option<Origin> {
        Origin::from_uri(&self.uri)
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable request headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Request body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Decomposes the request into its parts.
    pub fn into_parts(self) -> (Method, Uri, HeaderMap, Option<Bytes>) {
        (self.method, self.uri, self.headers, self.body)
    }
}
