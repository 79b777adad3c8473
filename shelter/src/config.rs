//! Startup configuration.
//!
//! A configuration can be built in code or loaded from YAML:
//!
//! ```yaml
//! version: 2
//! assets:
//!   origin: https://app.example.com
//!   namespace: streamlist
//!   manifest:
//!     - /
//!     - /index.html
//!     - /static/js/bundle.js
//! rules:
//!   - origin: api.themoviedb.org
//!     strategy: network-first
//!     namespace: tmdb
//! offload:
//!   timeout: 30s
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shelter_core::{Origin, PolicyRule, Strategy};
use smol_str::SmolStr;

use crate::error::ConfigError;
use crate::offload::{OffloadConfig, TimeoutPolicy};
use crate::policy::PolicyTable;

fn default_assets_namespace() -> SmolStr {
    SmolStr::new_static("static")
}

/// Complete startup configuration of an offline worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelterConfig {
    /// Cache version. Namespaces are named `{purpose}-cache-v{version}`.
    pub version: u32,
    /// Static application assets installed ahead of time.
    pub assets: AssetsConfig,
    /// Per-origin policy rules. The first matching rule wins.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    /// Purpose of the catch-all namespace for unmatched origins.
    ///
    /// Defaults to the assets namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_namespace: Option<SmolStr>,
    /// Background persist settings.
    #[serde(default)]
    pub offload: OffloadSettings,
}

/// Static asset manifest and where it is served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Origin the manifest paths are resolved against.
    pub origin: Origin,
    /// Purpose name of the static namespace.
    #[serde(default = "default_assets_namespace")]
    pub namespace: SmolStr,
    /// Ordered list of absolute paths fetched at install time.
    #[serde(default)]
    pub manifest: Vec<String>,
}

/// What happens when a background persist outlives its timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeoutAction {
    /// Abort the persist.
    #[default]
    Cancel,
    /// Let it finish and log a warning.
    Warn,
}

/// Background persist settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffloadSettings {
    /// Upper bound on a single persist.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Action taken once `timeout` elapses.
    #[serde(default)]
    pub on_timeout: TimeoutAction,
    /// Abort a running persist once a newer one for the same request starts.
    #[serde(default)]
    pub deduplicate: bool,
}

impl OffloadSettings {
    /// Converts these settings into an offload manager configuration.
    pub fn to_offload_config(&self) -> OffloadConfig {
        let timeout_policy = match (self.timeout, self.on_timeout) {
            (None, _) => TimeoutPolicy::None,
            (Some(duration), TimeoutAction::Cancel) => TimeoutPolicy::Cancel(duration),
            (Some(duration), TimeoutAction::Warn) => TimeoutPolicy::Warn(duration),
        };
        OffloadConfig::builder()
            .timeout_policy(timeout_policy)
            .deduplicate(self.deduplicate)
            .build()
    }
}

impl ShelterConfig {
    /// Creates a configuration with an empty manifest and no rules.
    pub fn new(version: u32, assets_origin: Origin) -> Self {
        ShelterConfig {
            version,
            assets: AssetsConfig {
                origin: assets_origin,
                namespace: default_assets_namespace(),
                manifest: Vec::new(),
            },
            rules: Vec::new(),
            fallback_namespace: None,
            offload: OffloadSettings::default(),
        }
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(input: &str) -> Result<Self, ConfigError> {
        let config: ShelterConfig =
            serde_saphyr::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the purpose name of the static namespace.
    pub fn assets_namespace(mut self, purpose: impl Into<SmolStr>) -> Self {
        self.assets.namespace = purpose.into();
        self
    }

    /// Replaces the static asset manifest.
    pub fn manifest<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assets.manifest = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a policy rule.
    pub fn rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends a network-first rule for `origin`.
    ///
    /// `origin` is a full origin or a bare host, see
    /// [`OriginPattern`](shelter_core::OriginPattern).
    pub fn network_first(
        self,
        origin: &str,
        namespace: impl Into<SmolStr>,
    ) -> Result<Self, ConfigError> {
        Ok(self.rule(PolicyRule::new(
            origin.parse()?,
            Strategy::NetworkFirst,
            namespace,
        )))
    }

    /// Appends a cache-first rule for `origin`.
    pub fn cache_first(
        self,
        origin: &str,
        namespace: impl Into<SmolStr>,
    ) -> Result<Self, ConfigError> {
        Ok(self.rule(PolicyRule::new(
            origin.parse()?,
            Strategy::CacheFirst,
            namespace,
        )))
    }

    /// Sets the purpose of the catch-all namespace.
    pub fn fallback_namespace(mut self, purpose: impl Into<SmolStr>) -> Self {
        self.fallback_namespace = Some(purpose.into());
        self
    }

    /// Sets the background persist settings.
    pub fn offload(mut self, offload: OffloadSettings) -> Self {
        self.offload = offload;
        self
    }

    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace("assets"));
        }
        if self.rules.iter().any(|rule| rule.namespace.trim().is_empty()) {
            return Err(ConfigError::EmptyNamespace("rule"));
        }
        if self
            .fallback_namespace
            .as_ref()
            .is_some_and(|purpose| purpose.trim().is_empty())
        {
            return Err(ConfigError::EmptyNamespace("fallback"));
        }
        if let Some(path) = self.assets.manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::RelativeManifestPath(path.clone()));
        }
        Ok(())
    }

    /// Builds the routing table for this configuration.
    pub fn policy(&self) -> PolicyTable {
        PolicyTable::new(
            self.version,
            &self.assets.namespace,
            self.rules.clone(),
            self.fallback_namespace.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offload_settings_to_policy() {
        let settings = OffloadSettings {
            timeout: Some(Duration::from_secs(5)),
            on_timeout: TimeoutAction::Warn,
            deduplicate: false,
        };
        assert_eq!(
            settings.to_offload_config().timeout_policy,
            TimeoutPolicy::Warn(Duration::from_secs(5))
        );
        assert_eq!(
            OffloadSettings::default().to_offload_config(),
            OffloadConfig::default()
        );
    }

    #[test]
    fn test_validate_rejects_relative_manifest_path() {
        let config = ShelterConfig::new(1, Origin::parse("https://app.example.com").unwrap())
            .manifest(["/", "index.html"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RelativeManifestPath(path)) if path == "index.html"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_rule_namespace() {
        let config = ShelterConfig::new(1, Origin::parse("https://app.example.com").unwrap())
            .network_first("api.example.com", " ")
            .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyNamespace("rule"))
        ));
    }
}
