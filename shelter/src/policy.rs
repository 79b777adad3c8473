//! Per-origin routing of requests to a strategy and a namespace.

use std::collections::BTreeSet;

use shelter_core::{NamespaceName, Origin, PolicyRule, Strategy};

/// Where and how a request is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Strategy applied to the request.
    pub strategy: Strategy,
    /// Namespace the request is looked up in and persisted to.
    pub namespace: NamespaceName,
}

/// Static routing table built from policy rules at startup.
///
/// Rules are evaluated in order and the first one that claims the request's
/// origin wins. Requests no rule claims, including relative ones, are
/// served cache-first from the catch-all namespace.
///
/// ```
/// use shelter::PolicyTable;
/// use shelter_core::{Origin, PolicyRule, Strategy};
///
/// let table = PolicyTable::new(
///     1,
///     "streamlist",
///     vec![PolicyRule::new("api.themoviedb.org".parse().unwrap(), Strategy::NetworkFirst, "tmdb")],
///     None,
/// );
///
/// let api = table.route(Some(&Origin::parse("https://api.themoviedb.org").unwrap()));
/// assert_eq!(api.strategy, Strategy::NetworkFirst);
/// assert_eq!(api.namespace.as_str(), "tmdb-cache-v1");
///
/// let other = table.route(None);
/// assert_eq!(other.strategy, Strategy::CacheFirst);
/// assert_eq!(other.namespace.as_str(), "streamlist-cache-v1");
/// ```
#[derive(Debug, Clone)]
pub struct PolicyTable {
    version: u32,
    rules: Vec<(PolicyRule, NamespaceName)>,
    static_namespace: NamespaceName,
    fallback: NamespaceName,
}

impl PolicyTable {
    /// Builds the table for cache `version`.
    ///
    /// `fallback` is the purpose of the catch-all namespace and defaults to
    /// `static_purpose`.
    pub fn new(
        version: u32,
        static_purpose: &str,
        rules: Vec<PolicyRule>,
        fallback: Option<&str>,
    ) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let name = NamespaceName::versioned(&rule.namespace, version);
                (rule, name)
            })
            .collect();
        PolicyTable {
            version,
            rules,
            static_namespace: NamespaceName::versioned(static_purpose, version),
            fallback: NamespaceName::versioned(fallback.unwrap_or(static_purpose), version),
        }
    }

    /// Cache version the namespace names are qualified with.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Namespace populated at install time.
    pub fn static_namespace(&self) -> &NamespaceName {
        &self.static_namespace
    }

    /// Namespace serving requests no rule claims.
    pub fn fallback_namespace(&self) -> &NamespaceName {
        &self.fallback
    }

    /// Configured rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &PolicyRule> {
        self.rules.iter().map(|(rule, _)| rule)
    }

    /// Resolves the route of a request sent to `origin`.
    pub fn route(&self, origin: Option<&Origin>) -> Route {
        origin
            .and_then(|origin| {
                self.rules
                    .iter()
                    .find(|(rule, _)| rule.applies_to(origin))
            })
            .map(|(rule, namespace)| Route {
                strategy: rule.strategy,
                namespace: namespace.clone(),
            })
            .unwrap_or_else(|| Route {
                strategy: Strategy::CacheFirst,
                namespace: self.fallback.clone(),
            })
    }

    /// Every namespace name live in this version.
    ///
    /// Activation deletes every other namespace.
    pub fn reserved_names(&self) -> BTreeSet<NamespaceName> {
        self.rules
            .iter()
            .map(|(_, name)| name.clone())
            .chain([self.static_namespace.clone(), self.fallback.clone()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(origin: &str, strategy: Strategy, namespace: &str) -> PolicyRule {
        PolicyRule::new(origin.parse().unwrap(), strategy, namespace)
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let table = PolicyTable::new(
            3,
            "static",
            vec![
                rule("https://api.example.com", Strategy::NetworkFirst, "api"),
                rule("api.example.com", Strategy::CacheFirst, "api-plain"),
            ],
            None,
        );

        let secure = table.route(Some(&Origin::parse("https://api.example.com").unwrap()));
        assert_eq!(secure.namespace.as_str(), "api-cache-v3");
        assert_eq!(secure.strategy, Strategy::NetworkFirst);

        let plain = table.route(Some(&Origin::parse("http://api.example.com").unwrap()));
        assert_eq!(plain.namespace.as_str(), "api-plain-cache-v3");
        assert_eq!(plain.strategy, Strategy::CacheFirst);
    }

    #[test]
    fn test_unmatched_origin_uses_fallback_namespace() {
        let table = PolicyTable::new(1, "static", Vec::new(), Some("misc"));
        let route = table.route(Some(&Origin::parse("https://cdn.example.com").unwrap()));
        assert_eq!(route.strategy, Strategy::CacheFirst);
        assert_eq!(route.namespace.as_str(), "misc-cache-v1");
    }

    #[test]
    fn test_reserved_names() {
        let table = PolicyTable::new(
            2,
            "streamlist",
            vec![rule("api.themoviedb.org", Strategy::NetworkFirst, "tmdb")],
            None,
        );
        let names: Vec<_> = table
            .reserved_names()
            .into_iter()
            .map(|name| name.as_str().to_owned())
            .collect();
        assert_eq!(names, vec!["streamlist-cache-v2", "tmdb-cache-v2"]);
    }
}
