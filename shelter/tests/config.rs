use std::time::Duration;

use pretty_assertions::assert_eq;
use shelter::{
    ConfigError, Origin, OriginPattern, ShelterConfig, Strategy, TimeoutAction, TimeoutPolicy,
};

#[test]
fn test_load_fixture() {
    let config = ShelterConfig::from_yaml(include_str!("fixtures/streamlist.yaml")).unwrap();

    assert_eq!(config.version, 2);
    assert_eq!(
        config.assets.origin,
        Origin::parse("https://streamlist.example.com").unwrap()
    );
    assert_eq!(config.assets.namespace, "streamlist");
    assert_eq!(
        config.assets.manifest,
        vec!["/", "/index.html", "/static/js/bundle.js", "/manifest.json"]
    );
    assert_eq!(config.rules.len(), 1);
    assert_eq!(
        config.rules[0].origin,
        OriginPattern::Host("api.themoviedb.org".into())
    );
    assert_eq!(config.rules[0].strategy, Strategy::NetworkFirst);
    assert_eq!(config.offload.timeout, Some(Duration::from_secs(30)));
    assert_eq!(config.offload.on_timeout, TimeoutAction::Warn);
    assert_eq!(
        config.offload.to_offload_config().timeout_policy,
        TimeoutPolicy::Warn(Duration::from_secs(30))
    );

    let names: Vec<_> = config
        .policy()
        .reserved_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, vec!["streamlist-cache-v2", "tmdb-cache-v2"]);
}

#[test]
fn test_minimal_document_uses_defaults() {
    let config = ShelterConfig::from_yaml(
        r#"
version: 1
assets:
  origin: http://localhost:3000
"#,
    )
    .unwrap();

    assert_eq!(config.assets.namespace, "static");
    assert!(config.assets.manifest.is_empty());
    assert!(config.rules.is_empty());
    assert_eq!(config.fallback_namespace, None);
    assert!(!config.offload.deduplicate);
    assert_eq!(
        config.policy().fallback_namespace().as_str(),
        "static-cache-v1"
    );
}

#[test]
fn test_invalid_origin_is_rejected() {
    let result = ShelterConfig::from_yaml(
        r#"
version: 1
assets:
  origin: app.example.com
"#,
    );
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_unknown_strategy_is_rejected() {
    let result = ShelterConfig::from_yaml(
        r#"
version: 1
assets:
  origin: https://app.example.com
rules:
  - origin: api.example.com
    strategy: stale-while-revalidate
    namespace: api
"#,
    );
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_builder_matches_yaml() {
    let built = ShelterConfig::new(2, Origin::parse("https://streamlist.example.com").unwrap())
        .assets_namespace("streamlist")
        .manifest(["/", "/index.html", "/static/js/bundle.js", "/manifest.json"])
        .network_first("api.themoviedb.org", "tmdb")
        .unwrap()
        .fallback_namespace("streamlist")
        .offload(shelter::OffloadSettings {
            timeout: Some(Duration::from_secs(30)),
            on_timeout: TimeoutAction::Warn,
            deduplicate: false,
        });

    let loaded = ShelterConfig::from_yaml(include_str!("fixtures/streamlist.yaml")).unwrap();
    assert_eq!(built, loaded);
}

#[test]
fn test_builder_rejects_bad_pattern() {
    let result = ShelterConfig::new(1, Origin::parse("https://app.example.com").unwrap())
        .cache_first("cdn.example.com/assets", "cdn");
    assert!(matches!(result, Err(ConfigError::Origin(_))));
}
