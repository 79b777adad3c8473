//! Conversions between reqwest and shelter types.

use bytes::Bytes;
use http::Uri;
use shelter_core::{FetchRequest, FetchResponse, NetworkError, OnceBody};

/// Maps a reqwest failure to a transport-level failure.
pub(crate) fn network_error(error: reqwest::Error) -> NetworkError {
    if error.is_timeout() {
        NetworkError::Timeout
    } else if error.is_connect() {
        NetworkError::Connect(Box::new(error))
    } else if error.is_builder() {
        NetworkError::InvalidRequest(error.to_string())
    } else {
        NetworkError::Transport(Box::new(error))
    }
}

/// Maps a failure of the rest of the middleware chain.
pub(crate) fn middleware_error(error: reqwest_middleware::Error) -> NetworkError {
    match error {
        reqwest_middleware::Error::Reqwest(error) => network_error(error),
        reqwest_middleware::Error::Middleware(error) => NetworkError::Transport(error.into()),
    }
}

/// Copies a reqwest request into a shelter request.
///
/// Returns `None` for streaming bodies, which cannot be replayed.
pub(crate) fn fetch_request(request: &reqwest::Request) -> Option<FetchRequest> {
    let uri: Uri = request.url().as_str().parse().ok()?;
    let mut fetch = FetchRequest::new(request.method().clone(), uri);
    *fetch.headers_mut() = request.headers().clone();
    match request.body() {
        None => Some(fetch),
        Some(body) => body
            .as_bytes()
            .map(|bytes| fetch.with_body(Bytes::copy_from_slice(bytes))),
    }
}

/// Builds the reqwest request sending `request`.
pub(crate) fn reqwest_request(request: FetchRequest) -> Result<reqwest::Request, NetworkError> {
    let (method, uri, headers, body) = request.into_parts();
    let url = reqwest::Url::parse(&uri.to_string())
        .map_err(|error| NetworkError::InvalidRequest(error.to_string()))?;
    let mut outbound = reqwest::Request::new(method, url);
    *outbound.headers_mut() = headers;
    *outbound.body_mut() = body.map(reqwest::Body::from);
    Ok(outbound)
}

/// Buffers a reqwest response into a shelter response.
///
/// A body that fails to download is a transport failure.
pub(crate) async fn fetch_response(
    response: reqwest::Response,
) -> Result<FetchResponse, NetworkError> {
    let status = response.status();
    let headers = response.headers().clone();
    let payload = response.bytes().await.map_err(network_error)?;
    Ok(FetchResponse::new(status, headers, OnceBody::new(payload)))
}

/// Converts a shelter response back into a reqwest response.
pub(crate) fn reqwest_response(response: FetchResponse) -> reqwest::Response {
    let (status, headers, body) = response.into_parts();
    let mut outbound = http::Response::new(reqwest::Body::from(body.into_bytes()));
    *outbound.status_mut() = status;
    *outbound.headers_mut() = headers;
    reqwest::Response::from(outbound)
}
