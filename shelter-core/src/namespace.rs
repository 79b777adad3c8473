//! Names of cache namespaces.
//!
//! A namespace is a named, independently deletable partition of the named
//! cache. Names are version-qualified so that a new application version gets
//! fresh partitions and the old ones can be recognized as garbage:
//!
//! ```
//! use shelter_core::NamespaceName;
//!
//! let name = NamespaceName::versioned("tmdb", 1);
//! assert_eq!(name.as_str(), "tmdb-cache-v1");
//! ```

use std::borrow::Borrow;
use std::fmt;

use smol_str::SmolStr;

/// Name of one partition of the named cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceName(SmolStr);

impl NamespaceName {
    /// Wraps an arbitrary name, for example one listed by a backend.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        NamespaceName(name.into())
    }

    /// Builds the name reserved for `purpose` in cache `version`.
    pub fn versioned(purpose: &str, version: u32) -> Self {
        NamespaceName(SmolStr::from(format!("{purpose}-cache-v{version}")))
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for NamespaceName {
    fn from(s: &str) -> Self {
        NamespaceName::new(s)
    }
}

impl Borrow<str> for NamespaceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
