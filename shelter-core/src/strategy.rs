//! Caching strategies and the rules that select them.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::origin::{Origin, OriginPattern};

/// Whether the network or the cache is consulted first for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Ask the network; fall back to the cached copy on transport failure.
    ///
    /// Every successful response is persisted in the background.
    NetworkFirst,
    /// Serve the cached copy when present; otherwise ask the network
    /// without populating the cache.
    CacheFirst,
}

impl Strategy {
    /// Returns the strategy as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network-first",
            Strategy::CacheFirst => "cache-first",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an origin to a strategy and the namespace purpose it caches into.
///
/// Rules are static: they are defined at startup and never persisted.
///
/// ```
/// use shelter_core::{Origin, PolicyRule, Strategy};
///
/// let rule = PolicyRule::new("api.themoviedb.org".parse().unwrap(), Strategy::NetworkFirst, "tmdb");
/// assert!(rule.applies_to(&Origin::parse("https://api.themoviedb.org").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Origins claimed by this rule.
    pub origin: OriginPattern,
    /// Strategy applied to claimed requests.
    pub strategy: Strategy,
    /// Purpose name of the namespace reserved for claimed requests.
    ///
    /// The concrete namespace name is derived from it and the cache version.
    pub namespace: SmolStr,
}

impl PolicyRule {
    /// Creates a new rule.
    pub fn new(origin: OriginPattern, strategy: Strategy, namespace: impl Into<SmolStr>) -> Self {
        PolicyRule {
            origin,
            strategy,
            namespace: namespace.into(),
        }
    }

    /// Returns `true` if this rule claims requests from `origin`.
    pub fn applies_to(&self, origin: &Origin) -> bool {
        self.origin.matches(origin)
    }
}
