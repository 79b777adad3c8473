mod common;

use std::sync::Arc;

use http::StatusCode;
use pretty_assertions::assert_eq;
use shelter::{
    CacheLifecycleManager, LifecycleError, NamespaceName, Origin, Phase, PolicyRule, PolicyTable,
    RequestKey, Strategy,
};
use shelter_backend::NamedCache;
use shelter_moka::MokaNamedCache;

use common::{FaultyCache, StubTransport, init_tracing, namespace_names};

const APP: &str = "https://app.example.com";

fn manifest() -> Vec<String> {
    ["/", "/index.html", "/static/js/bundle.js"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn policy(version: u32) -> PolicyTable {
    PolicyTable::new(
        version,
        "static",
        vec![PolicyRule::new(
            "api.example.com".parse().unwrap(),
            Strategy::NetworkFirst,
            "api",
        )],
        None,
    )
}

fn manager<C: NamedCache>(cache: Arc<C>, version: u32) -> CacheLifecycleManager<C> {
    CacheLifecycleManager::new(cache, policy(version), Origin::parse(APP).unwrap(), manifest())
}

fn serving_transport() -> StubTransport {
    let transport = StubTransport::new();
    transport
        .ok("https://app.example.com/", "<html>")
        .ok("https://app.example.com/index.html", "<html>")
        .ok("https://app.example.com/static/js/bundle.js", "console.log(1)");
    transport
}

async fn open_all<C: NamedCache>(cache: &C, names: &[&str]) {
    for name in names {
        cache.open(&NamespaceName::new(*name)).await.unwrap();
    }
}

#[tokio::test]
async fn test_install_populates_static_namespace() {
    init_tracing();
    let cache = Arc::new(MokaNamedCache::new());
    let mut lifecycle = manager(cache.clone(), 1);
    let transport = serving_transport();

    lifecycle.on_install(&transport).await.unwrap();

    assert_eq!(lifecycle.phase(), Phase::Installed);
    assert_eq!(transport.calls(), 3);
    let handle = cache
        .open(&NamespaceName::versioned("static", 1))
        .await
        .unwrap();
    for path in manifest() {
        let key = RequestKey::get(format!("{APP}{path}"));
        assert!(
            cache.lookup(&handle, &key).await.unwrap().is_some(),
            "missing {key}"
        );
    }
}

#[tokio::test]
async fn test_activation_removes_previous_version() {
    init_tracing();
    let cache = Arc::new(MokaNamedCache::new());
    open_all(
        cache.as_ref(),
        &["static-cache-v1", "api-cache-v1", "api-cache-v2", "legacy"],
    )
    .await;

    let mut lifecycle = manager(cache.clone(), 2);
    lifecycle.on_install(&serving_transport()).await.unwrap();
    let report = lifecycle.on_activate().await.unwrap();

    assert_eq!(lifecycle.phase(), Phase::Active);
    assert_eq!(
        namespace_names(cache.as_ref()).await,
        vec!["api-cache-v2", "static-cache-v2"]
    );
    assert_eq!(report.deleted.len(), 3);
    assert!(report.failed.is_empty());
    assert!(
        namespace_names(cache.as_ref())
            .await
            .iter()
            .all(|name| !name.ends_with("-v1"))
    );
}

#[tokio::test]
async fn test_broken_manifest_entry_fails_install() {
    init_tracing();
    let cache = Arc::new(MokaNamedCache::new());
    open_all(cache.as_ref(), &["static-cache-v1", "api-cache-v1"]).await;

    let transport = serving_transport();
    transport.respond(
        "https://app.example.com/static/js/bundle.js",
        StatusCode::NOT_FOUND,
        "",
    );
    let mut lifecycle = manager(cache.clone(), 2);

    let error = lifecycle.on_install(&transport).await.unwrap_err();
    assert!(matches!(
        &error,
        LifecycleError::ManifestInstall { url, .. } if url == "https://app.example.com/static/js/bundle.js"
    ));
    assert_eq!(lifecycle.phase(), Phase::Failed);

    assert!(matches!(
        lifecycle.on_activate().await,
        Err(LifecycleError::NotInstalled { version: 2 })
    ));
    assert_eq!(
        namespace_names(cache.as_ref()).await,
        vec!["api-cache-v1", "static-cache-v1"]
    );
}

#[tokio::test]
async fn test_offline_install_fails() {
    init_tracing();
    let cache = Arc::new(MokaNamedCache::new());
    let transport = serving_transport();
    transport.set_offline(true);
    let mut lifecycle = manager(cache.clone(), 1);

    assert!(matches!(
        lifecycle.on_install(&transport).await,
        Err(LifecycleError::ManifestInstall { .. })
    ));
    assert!(namespace_names(cache.as_ref()).await.is_empty());
}

#[tokio::test]
async fn test_failed_reinstall_keeps_existing_namespace() {
    init_tracing();
    let cache = Arc::new(MokaNamedCache::new());
    manager(cache.clone(), 1)
        .on_install(&serving_transport())
        .await
        .unwrap();

    let transport = serving_transport();
    transport.set_offline(true);
    let mut retry = manager(cache.clone(), 1);
    assert!(retry.on_install(&transport).await.is_err());

    let handle = cache
        .open(&NamespaceName::versioned("static", 1))
        .await
        .unwrap();
    let key = RequestKey::get("https://app.example.com/index.html");
    assert!(cache.lookup(&handle, &key).await.unwrap().is_some());
}

#[tokio::test]
async fn test_activation_deletion_is_best_effort() {
    init_tracing();
    let cache = Arc::new(FaultyCache::new());
    open_all(
        cache.as_ref(),
        &["static-cache-v1", "api-cache-v1", "static-cache-v0"],
    )
    .await;
    cache.refuse_delete("api-cache-v1");

    let mut lifecycle = manager(cache.clone(), 2);
    lifecycle.on_install(&serving_transport()).await.unwrap();
    let report = lifecycle.on_activate().await.unwrap();

    assert_eq!(lifecycle.phase(), Phase::Active);
    assert_eq!(report.failed, vec![NamespaceName::new("api-cache-v1")]);
    assert_eq!(
        namespace_names(cache.as_ref()).await,
        vec!["api-cache-v1", "static-cache-v2"]
    );
}

#[tokio::test]
async fn test_activation_requires_install() {
    let mut lifecycle = manager(Arc::new(MokaNamedCache::new()), 3);
    assert!(matches!(
        lifecycle.on_activate().await,
        Err(LifecycleError::NotInstalled { version: 3 })
    ));
    assert_eq!(lifecycle.phase(), Phase::Pending);
}

#[tokio::test]
async fn test_supersede_after_newer_activation() {
    init_tracing();
    let cache = Arc::new(MokaNamedCache::new());
    let mut v1 = manager(cache.clone(), 1);
    v1.on_install(&serving_transport()).await.unwrap();
    v1.on_activate().await.unwrap();

    let mut v2 = manager(cache.clone(), 2);
    v2.on_install(&serving_transport()).await.unwrap();
    v2.on_activate().await.unwrap();
    v1.supersede();

    assert_eq!(v1.phase(), Phase::Superseded);
    assert_eq!(v2.phase(), Phase::Active);
    assert_eq!(
        namespace_names(cache.as_ref()).await,
        vec!["static-cache-v2"]
    );
}

#[tokio::test]
async fn test_install_twice_fetches_once() {
    init_tracing();
    let transport = serving_transport();
    let mut lifecycle = manager(Arc::new(MokaNamedCache::new()), 1);
    lifecycle.on_install(&transport).await.unwrap();
    lifecycle.on_install(&transport).await.unwrap();
    assert_eq!(transport.calls(), 3);
}
