use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use netopt_backend::{DeleteStatus, MemoryStore, Store};
use netopt_core::{CacheEntry, Request, RequestKey};

fn key(url: &str) -> RequestKey {
    Request::get(url).key()
}

fn entry(body: &'static str, ttl: Duration) -> CacheEntry<Bytes> {
    CacheEntry::new(Bytes::from_static(body.as_bytes()), Utc::now(), ttl)
}

#[tokio::test]
async fn write_then_read() {
    let store = MemoryStore::new();
    store
        .write(&key("/api/events"), entry("[1,2]", Duration::from_secs(60)))
        .await
        .unwrap();

    let read = store.read(&key("/api/events")).await.unwrap().unwrap();
    assert_eq!(read.value().as_ref(), b"[1,2]");
    assert!(store.read(&key("/api/blogs")).await.unwrap().is_none());
}

#[tokio::test]
async fn expired_entries_stay_readable_until_swept() {
    let store = MemoryStore::new();
    let stored_at = Utc::now() - chrono::Duration::seconds(30);
    store
        .write(
            &key("/api/events"),
            CacheEntry::new(Bytes::from_static(b"old"), stored_at, Duration::from_secs(10)),
        )
        .await
        .unwrap();
    store
        .write(&key("/api/blogs"), entry("fresh", Duration::from_secs(60)))
        .await
        .unwrap();

    let stale = store.read(&key("/api/events")).await.unwrap().unwrap();
    assert!(!stale.is_valid_at(Utc::now()));

    let kept = store
        .sweep(Utc::now(), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(kept, 0, "still inside the retention window");

    let dropped = store.sweep(Utc::now(), Duration::ZERO).await.unwrap();
    assert_eq!(dropped, 1);
    assert!(store.read(&key("/api/events")).await.unwrap().is_none());
    assert!(store.read(&key("/api/blogs")).await.unwrap().is_some());
}

#[tokio::test]
async fn remove_and_clear() {
    let store = MemoryStore::new();
    store
        .write(&key("/a"), entry("a", Duration::from_secs(60)))
        .await
        .unwrap();
    store
        .write(&key("/b"), entry("b", Duration::from_secs(60)))
        .await
        .unwrap();

    assert_eq!(store.remove(&key("/a")).await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(store.remove(&key("/a")).await.unwrap(), DeleteStatus::Missing);

    store.clear().await.unwrap();
    assert!(store.is_empty());
}

#[tokio::test]
async fn clones_share_entries_through_trait_objects() {
    let store = MemoryStore::new().with_label("session");
    let shared: Arc<dyn Store + Send> = Arc::new(store.clone());

    shared
        .write(&key("/api/programs"), entry("p", Duration::from_secs(60)))
        .await
        .unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(shared.label().as_str(), "session");
}
