//! Request origins and the patterns policy rules match them with.
//!
//! An [`Origin`] is scheme + host + port. Default ports (80 for `http`, 443
//! for `https`) are dropped during normalization so `https://a.com` and
//! `https://a.com:443` compare equal.
//!
//! An [`OriginPattern`] is what a policy rule is written against. It is
//! either a full origin (`https://api.example.com`, exact match), a bare
//! host (`api.example.com`, any scheme and port) or a host and port
//! (`localhost:8080`, any scheme).

use std::fmt;
use std::str::FromStr;

use http::Uri;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Error produced when an origin or origin pattern cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OriginError {
    /// The input is not a valid URI.
    #[error("invalid origin `{0}`")]
    Invalid(String),
    /// The URI has no scheme or no host.
    #[error("origin `{0}` must include a scheme and a host")]
    Incomplete(String),
    /// The pattern is empty.
    #[error("origin pattern must not be empty")]
    Empty,
}

/// Scheme, host and port identifying the source of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin {
    scheme: SmolStr,
    host: SmolStr,
    port: Option<u16>,
}

impl Origin {
    /// Extracts the origin of an absolute URI.
    ///
    /// Returns `None` for relative URIs.
    pub fn from_uri(uri: &Uri) -> Option<Origin> {
        let scheme = uri.scheme_str()?.to_ascii_lowercase();
        let host = uri.host()?.to_ascii_lowercase();
        let port = uri
            .port_u16()
            .filter(|port| default_port(&scheme) != Some(*port));
        Some(Origin {
            scheme: scheme.into(),
            host: host.into(),
            port,
        })
    }

    /// Parses an origin such as `https://api.example.com:8443`.
    ///
    /// A path, if present, is ignored.
    pub fn parse(input: &str) -> Result<Origin, OriginError> {
        let uri: Uri = input
            .parse()
            .map_err(|_| OriginError::Invalid(input.to_owned()))?;
        Origin::from_uri(&uri).ok_or_else(|| OriginError::Incomplete(input.to_owned()))
    }

    /// Returns the lower-cased scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the lower-cased host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the explicit, non-default port if any.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Resolves an absolute path (`/index.html`) against this origin.
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self, path)
        } else {
            format!("{}/{}", self, path)
        }
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

impl FromStr for Origin {
    type Err = OriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Origin::parse(s)
    }
}

impl TryFrom<String> for Origin {
    type Error = OriginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Origin::parse(&value)
    }
}

impl From<Origin> for String {
    fn from(origin: Origin) -> Self {
        origin.to_string()
    }
}

/// Pattern a policy rule uses to claim requests.
///
/// ```
/// use shelter_core::{Origin, OriginPattern};
///
/// let host: OriginPattern = "api.example.com".parse().unwrap();
/// let exact: OriginPattern = "https://api.example.com".parse().unwrap();
///
/// let secure = Origin::parse("https://api.example.com").unwrap();
/// let plain = Origin::parse("http://api.example.com:8080").unwrap();
///
/// assert!(host.matches(&secure) && host.matches(&plain));
/// assert!(exact.matches(&secure) && !exact.matches(&plain));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OriginPattern {
    /// Matches one origin exactly.
    Exact(Origin),
    /// Matches any origin served by this host.
    Host(SmolStr),
    /// Matches this host on this port under any scheme.
    HostPort(SmolStr, u16),
}

impl OriginPattern {
    /// Returns `true` if `origin` is claimed by this pattern.
    pub fn matches(&self, origin: &Origin) -> bool {
        match self {
            OriginPattern::Exact(expected) => expected == origin,
            OriginPattern::Host(host) => host.as_str() == origin.host(),
            OriginPattern::HostPort(host, port) => {
                host.as_str() == origin.host()
                    && origin.port().or_else(|| default_port(origin.scheme())) == Some(*port)
            }
        }
    }
}

impl FromStr for OriginPattern {
    type Err = OriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(OriginError::Empty);
        }
        if trimmed.contains("://") {
            Origin::parse(trimmed).map(OriginPattern::Exact)
        } else if trimmed.contains('/') {
            Err(OriginError::Invalid(trimmed.to_owned()))
        } else if let Some((host, port)) = trimmed.rsplit_once(':') {
            let port = port
                .parse()
                .map_err(|_| OriginError::Invalid(trimmed.to_owned()))?;
            if host.is_empty() {
                return Err(OriginError::Invalid(trimmed.to_owned()));
            }
            Ok(OriginPattern::HostPort(host.to_ascii_lowercase().into(), port))
        } else {
            Ok(OriginPattern::Host(trimmed.to_ascii_lowercase().into()))
        }
    }
}

impl TryFrom<String> for OriginPattern {
    type Error = OriginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OriginPattern> for String {
    fn from(pattern: OriginPattern) -> Self {
        pattern.to_string()
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginPattern::Exact(origin) => origin.fmt(f),
            OriginPattern::Host(host) => host.fmt(f),
            OriginPattern::HostPort(host, port) => write!(f, "{}:{}", host, port),
        }
    }
}
