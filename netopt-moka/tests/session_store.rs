//! Tests for the Moka-backed session store.

use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use netopt_backend::{DeleteStatus, Store};
use netopt_core::{CacheEntry, Request, RequestKey};
use netopt_moka::{EvictionPolicy, MokaStore, MokaStoreBuilder};

fn make_key(id: u32) -> RequestKey {
    Request::get(format!("/api/events/{id}")).key()
}

fn make_entry(size: usize, ttl: Duration) -> CacheEntry<Bytes> {
    CacheEntry::new(Bytes::from(vec![0u8; size]), Utc::now(), ttl)
}

fn entry_size(key: &RequestKey, entry: &CacheEntry<Bytes>) -> usize {
    key.memory_size() + entry.memory_size()
}

#[tokio::test]
async fn read_write_remove() {
    let store = MokaStore::builder().max_entries(100).build();
    let key = make_key(1);

    assert!(store.read(&key).await.unwrap().is_none());
    store
        .write(&key, make_entry(10, Duration::from_secs(60)))
        .await
        .unwrap();
    assert_eq!(
        store.read(&key).await.unwrap().unwrap().value().len(),
        10
    );

    assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Missing);
}

#[tokio::test]
async fn clear_drops_everything() {
    let store = MokaStore::builder().label("session").max_entries(100).build();
    for i in 1..=5 {
        store
            .write(&make_key(i), make_entry(10, Duration::from_secs(60)))
            .await
            .unwrap();
    }

    store.clear().await.unwrap();

    for i in 1..=5 {
        assert!(store.read(&make_key(i)).await.unwrap().is_none());
    }
    assert_eq!(store.label().as_str(), "session");
}

#[tokio::test]
async fn expired_entries_stay_readable_during_retention() {
    let store = MokaStore::builder()
        .max_entries(100)
        .retention(Duration::from_secs(60))
        .build();
    let key = make_key(1);
    let stored_at = Utc::now() - chrono::Duration::seconds(10);
    store
        .write(
            &key,
            CacheEntry::new(Bytes::from_static(b"stale"), stored_at, Duration::from_secs(1)),
        )
        .await
        .unwrap();
    store.cache().run_pending_tasks().await;

    let entry = store.read(&key).await.unwrap().expect("kept for retention");
    assert!(!entry.is_valid_at(Utc::now()));
}

#[tokio::test]
async fn entries_are_evicted_after_ttl_plus_retention() {
    let store = MokaStore::builder()
        .max_entries(100)
        .retention(Duration::from_millis(50))
        .build();
    let key = make_key(1);
    store
        .write(&key, make_entry(10, Duration::from_millis(50)))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    store.cache().run_pending_tasks().await;

    assert!(store.read(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn lifetime_counts_from_the_write() {
    let store = MokaStore::builder()
        .max_entries(100)
        .retention(Duration::ZERO)
        .build();
    let key = make_key(1);
    let stored_at = Utc::now() - chrono::Duration::days(365);
    store
        .write(
            &key,
            CacheEntry::new(Bytes::from_static(b"old"), stored_at, Duration::from_secs(60)),
        )
        .await
        .unwrap();

    store.cache().run_pending_tasks().await;

    assert!(store.read(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn rewrite_restarts_expiration() {
    let store = MokaStore::builder()
        .max_entries(100)
        .retention(Duration::ZERO)
        .build();
    let key = make_key(1);
    store
        .write(&key, make_entry(10, Duration::from_millis(100)))
        .await
        .unwrap();
    store
        .write(&key, make_entry(10, Duration::from_secs(60)))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    store.cache().run_pending_tasks().await;

    assert!(store.read(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn max_bytes_evicts_to_fit() {
    let key = make_key(1);
    let entry = make_entry(100, Duration::from_secs(3600));
    let capacity = entry_size(&key, &entry) * 3;

    let store = MokaStoreBuilder::default()
        .max_bytes(capacity as u64)
        .build();

    for i in 1..=4 {
        store
            .write(&make_key(i), make_entry(100, Duration::from_secs(3600)))
            .await
            .unwrap();
        store.cache().run_pending_tasks().await;
    }

    assert!(store.read(&make_key(4)).await.unwrap().is_some());
    let mut count = 0;
    for i in 1..=4 {
        if store.read(&make_key(i)).await.unwrap().is_some() {
            count += 1;
        }
    }
    assert_eq!(count, 3);
}

#[tokio::test]
async fn explicit_lru_with_entry_capacity() {
    let store = MokaStore::builder()
        .max_entries(3)
        .eviction_policy(EvictionPolicy::lru())
        .build();

    for i in 1..=4 {
        store
            .write(&make_key(i), make_entry(10, Duration::from_secs(3600)))
            .await
            .unwrap();
        store.cache().run_pending_tasks().await;
    }

    assert!(store.read(&make_key(4)).await.unwrap().is_some());
    let mut count = 0;
    for i in 1..=4 {
        if store.read(&make_key(i)).await.unwrap().is_some() {
            count += 1;
        }
    }
    assert_eq!(count, 3);
}
