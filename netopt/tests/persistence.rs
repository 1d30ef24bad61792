mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailingStore, MockTransport, ok};
use netopt::{FetchOptions, NetworkOptimizer, Persistence, Request};
use netopt_backend::{MemoryStore, Store};
use netopt_feoxdb::FeOxDbStore;
use netopt_moka::MokaStore;

const TTL: Duration = Duration::from_secs(300);

fn transport() -> Arc<MockTransport> {
    Arc::new(MockTransport::new().reply("/api/profile", ok(r#"{"name":"Ada"}"#)))
}

fn session() -> FetchOptions {
    FetchOptions::default()
        .ttl(TTL)
        .persistence(Persistence::Session)
}

#[tokio::test]
async fn session_entries_survive_a_new_engine() {
    let store = MokaStore::builder().max_entries(100).build();

    let first = transport();
    let optimizer = NetworkOptimizer::builder(first.clone())
        .session_store(store.clone())
        .build();
    optimizer
        .fetch_with(Request::get("/api/profile"), session())
        .await
        .unwrap();
    assert_eq!(first.calls("/api/profile"), 1);

    let second = transport();
    let reloaded = NetworkOptimizer::builder(second.clone())
        .session_store(store.clone())
        .build();
    let body = reloaded
        .fetch_with(Request::get("/api/profile"), session())
        .await
        .unwrap();

    assert_eq!(body, r#"{"name":"Ada"}"#);
    assert_eq!(second.calls("/api/profile"), 0);
    assert_eq!(reloaded.stats().hits, 1);
}

#[tokio::test]
async fn memory_only_calls_ignore_persisted_entries() {
    let store = MemoryStore::new().with_label("session");

    let optimizer = NetworkOptimizer::builder(transport())
        .session_store(store.clone())
        .build();
    optimizer
        .fetch_with(Request::get("/api/profile"), session())
        .await
        .unwrap();

    let second = transport();
    let reloaded = NetworkOptimizer::builder(second.clone())
        .session_store(store.clone())
        .build();
    reloaded
        .fetch_with(Request::get("/api/profile"), FetchOptions::default().ttl(TTL))
        .await
        .unwrap();

    assert_eq!(second.calls("/api/profile"), 1);
}

#[tokio::test]
async fn durable_entries_hydrate_memory() {
    let store = FeOxDbStore::in_memory().unwrap();
    let durable = FetchOptions::default()
        .ttl(TTL)
        .persistence(Persistence::Durable);

    let optimizer = NetworkOptimizer::builder(transport())
        .durable_store(store.clone())
        .build();
    optimizer
        .fetch_with(Request::get("/api/profile"), durable)
        .await
        .unwrap();

    let second = transport();
    let reloaded = NetworkOptimizer::builder(second.clone())
        .durable_store(store.clone())
        .build();
    reloaded
        .fetch_with(Request::get("/api/profile"), durable)
        .await
        .unwrap();
    assert_eq!(second.calls("/api/profile"), 0);

    store.clear().await.unwrap();
    reloaded
        .fetch(Request::get("/api/profile"))
        .await
        .unwrap();
    assert_eq!(second.calls("/api/profile"), 0);
}

#[tokio::test]
async fn missing_store_falls_back_to_memory() {
    let transport = transport();
    let optimizer = NetworkOptimizer::new(transport.clone());

    optimizer
        .fetch_with(Request::get("/api/profile"), session())
        .await
        .unwrap();
    optimizer
        .fetch_with(Request::get("/api/profile"), session())
        .await
        .unwrap();

    assert_eq!(transport.calls("/api/profile"), 1);
}

#[tokio::test]
async fn invalidate_and_clear_reach_persisted_stores() {
    let store = MemoryStore::new().with_label("session");
    let transport = transport();
    let optimizer = NetworkOptimizer::builder(transport.clone())
        .session_store(store.clone())
        .build();
    let key = Request::get("/api/profile").key();

    optimizer
        .fetch_with(Request::get("/api/profile"), session())
        .await
        .unwrap();
    assert!(store.read(&key).await.unwrap().is_some());

    optimizer.invalidate_key(&key).await;
    assert!(store.is_empty());

    optimizer
        .fetch_with(Request::get("/api/profile"), session())
        .await
        .unwrap();
    assert_eq!(transport.calls("/api/profile"), 2);

    optimizer.clear_cache().await;
    assert!(store.is_empty());
}

#[tokio::test]
async fn store_failures_behave_like_an_empty_store() {
    let session = FailingStore::new();
    let durable = FailingStore::new();
    let transport = Arc::new(
        MockTransport::new()
            .reply("/api/profile", ok(r#"{"name":"Ada"}"#))
            .reply("/api/settings", ok(r#"{"theme":"dark"}"#)),
    );
    let optimizer = NetworkOptimizer::builder(transport.clone())
        .session_store(session.clone())
        .durable_store(durable.clone())
        .build();

    let body = optimizer
        .fetch_with(Request::get("/api/profile"), crate::session())
        .await
        .unwrap();
    assert_eq!(body, r#"{"name":"Ada"}"#);

    let again = optimizer
        .fetch_with(Request::get("/api/profile"), crate::session())
        .await
        .unwrap();
    assert_eq!(again, body);
    assert_eq!(transport.calls("/api/profile"), 1);

    let durable_options = FetchOptions::default()
        .ttl(TTL)
        .persistence(Persistence::Durable);
    let settings = optimizer
        .fetch_with(Request::get("/api/settings"), durable_options)
        .await
        .unwrap();
    assert_eq!(settings, r#"{"theme":"dark"}"#);

    optimizer.invalidate(&Request::get("/api/profile")).await;
    optimizer.clear_cache().await;

    // read + write per cold fetch, then remove + clear.
    assert_eq!(session.attempts(), 4);
    assert_eq!(durable.attempts(), 4);
    let stats = optimizer.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.failures, 0);
}
