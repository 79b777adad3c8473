//! Single-use response bodies.
//!
//! A response body can be read at most once. [`OnceBody`] enforces this in
//! the type system: it is not `Clone`, every reading method consumes it, and
//! the only way to get two readers is [`OnceBody::tee`], which splits one
//! body into two independent single-use bodies.
//!
//! The interceptor relies on this to capture the copy it persists *before*
//! the caller consumes the live body:
//!
//! ```
//! use shelter_core::OnceBody;
//!
//! let body = OnceBody::new(r#"{"id":1}"#);
//! let (live, copy) = body.tee();
//!
//! let persisted = copy.into_bytes();
//! let value: serde_json::Value = live.json().unwrap();
//! assert_eq!(value["id"], 1);
//! assert_eq!(&persisted[..], br#"{"id":1}"#);
//! ```

use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Error produced when a body cannot be decoded.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body is not valid UTF-8.
    #[error("response body is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The body is not valid JSON for the requested type.
    #[error("response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A response body that can be consumed exactly once.
pub struct OnceBody {
    bytes: Bytes,
}

impl OnceBody {
    /// Wraps a fully buffered payload.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        OnceBody {
            bytes: bytes.into(),
        }
    }

    /// An empty body.
    pub fn empty() -> Self {
        OnceBody {
            bytes: Bytes::new(),
        }
    }

    /// Payload length in bytes. Does not consume the body.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Splits this body into two independent single-use bodies.
    ///
    /// Both halves see the full payload. The underlying buffer is shared, so
    /// this does not copy the bytes.
    pub fn tee(self) -> (OnceBody, OnceBody) {
        let copy = OnceBody {
            bytes: self.bytes.clone(),
        };
        (self, copy)
    }

    /// Consumes the body and returns the raw payload.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Consumes the body and decodes it as UTF-8 text.
    pub fn text(self) -> Result<String, BodyError> {
        Ok(String::from_utf8(self.bytes.to_vec())?)
    }

    /// Consumes the body and decodes it as JSON.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, BodyError> {
        Ok(serde_json::from_slice(&self.bytes)?)
    }
}

impl fmt::Debug for OnceBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceBody")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Default for OnceBody {
    fn default() -> Self {
        Self::empty()
    }
}
