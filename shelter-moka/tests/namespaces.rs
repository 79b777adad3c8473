//! Tests for namespace semantics of the Moka named cache.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use shelter_backend::{CacheHandle, DeleteStatus, NamedCache};
use shelter_core::{CacheEntry, NamespaceName, RequestKey, Strategy};
use shelter_moka::MokaNamedCache;

fn entry(key: &RequestKey, payload: &'static str) -> CacheEntry {
    CacheEntry::new(
        key.clone(),
        StatusCode::OK,
        HeaderMap::new(),
        Bytes::from_static(payload.as_bytes()),
        Strategy::NetworkFirst,
    )
}

#[tokio::test]
async fn test_open_is_idempotent() {
    let cache = MokaNamedCache::new();
    let name = NamespaceName::versioned("tmdb", 1);
    let key = RequestKey::get("https://api.example.com/movies/popular");

    let first = cache.open(&name).await.unwrap();
    let second = cache.open(&name).await.unwrap();

    cache.put(&first, &key, entry(&key, r#"{"id":1}"#)).await.unwrap();

    let seen = cache.lookup(&second, &key).await.unwrap().unwrap();
    assert_eq!(seen.payload(), &Bytes::from_static(br#"{"id":1}"#));
    assert_eq!(second.namespace(), &name);
    assert_eq!(cache.namespaces().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_lookup_miss_is_none() {
    let cache = MokaNamedCache::new();
    let handle = cache.open(&"static-cache-v1".into()).await.unwrap();
    let key = RequestKey::get("https://app.example.com/index.html");
    assert!(cache.lookup(&handle, &key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_put_overwrites_entry() {
    let cache = MokaNamedCache::new();
    let handle = cache.open(&"tmdb-cache-v1".into()).await.unwrap();
    let key = RequestKey::get("https://api.example.com/movies/popular");

    cache.put(&handle, &key, entry(&key, "old")).await.unwrap();
    cache.put(&handle, &key, entry(&key, "new")).await.unwrap();

    let seen = cache.lookup(&handle, &key).await.unwrap().unwrap();
    assert_eq!(seen.payload(), &Bytes::from_static(b"new"));
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let cache = MokaNamedCache::new();
    let api = cache.open(&"tmdb-cache-v1".into()).await.unwrap();
    let assets = cache.open(&"streamlist-cache-v1".into()).await.unwrap();
    let key = RequestKey::get("https://api.example.com/movies/popular");

    cache.put(&api, &key, entry(&key, "api")).await.unwrap();
    assert!(cache.lookup(&assets, &key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_removes_namespace_and_entries() {
    let cache = MokaNamedCache::new();
    let name = NamespaceName::versioned("tmdb", 1);
    let key = RequestKey::get("https://api.example.com/movies/popular");

    let handle = cache.open(&name).await.unwrap();
    cache.put(&handle, &key, entry(&key, "payload")).await.unwrap();

    assert_eq!(cache.delete(&name).await.unwrap(), DeleteStatus::Deleted(1));
    assert!(!cache.namespaces().await.unwrap().contains(&name));
    assert_eq!(cache.delete(&name).await.unwrap(), DeleteStatus::Missing);

    let reopened = cache.open(&name).await.unwrap();
    assert!(cache.lookup(&reopened, &key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_write_through_stale_handle_is_dropped() {
    let cache = MokaNamedCache::new();
    let name = NamespaceName::versioned("tmdb", 1);
    let key = RequestKey::get("https://api.example.com/movies/popular");

    let stale = cache.open(&name).await.unwrap();
    cache.delete(&name).await.unwrap();

    // A persist racing with deletion must not resurrect the namespace.
    cache.put(&stale, &key, entry(&key, "late")).await.unwrap();
    assert!(cache.namespaces().await.unwrap().is_empty());

    let fresh = cache.open(&name).await.unwrap();
    assert!(cache.lookup(&fresh, &key).await.unwrap().is_none());
}

#[tokio::test]
async fn test_max_entries_bounds_each_namespace() {
    let cache = MokaNamedCache::builder().max_entries(2).build();
    let handle = cache.open(&"search-cache-v1".into()).await.unwrap();

    for page in 0..10 {
        let key = RequestKey::get(format!("https://api.example.com/search?page={page}"));
        cache.put(&handle, &key, entry(&key, "page")).await.unwrap();
    }
    handle.sync().await;

    assert!(handle.entry_count() <= 2);
}

#[tokio::test]
async fn test_open_existing_never_creates() {
    let cache = MokaNamedCache::new();
    let name = NamespaceName::versioned("static", 1);

    assert!(cache.open_existing(&name).await.unwrap().is_none());
    assert!(cache.namespaces().await.unwrap().is_empty());

    let handle = cache.open(&name).await.unwrap();
    let key = RequestKey::get("https://app.example.com/index.html");
    cache.put(&handle, &key, entry(&key, "<html>")).await.unwrap();

    let existing = cache.open_existing(&name).await.unwrap().unwrap();
    assert_eq!(existing.namespace(), &name);
    assert!(cache.lookup(&existing, &key).await.unwrap().is_some());
}
