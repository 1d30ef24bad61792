mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockTransport, ok};
use netopt::offload::OffloadManager;
use netopt::{FetchOptions, NetworkOptimizer, OptimizerConfig, Persistence, Request};
use netopt_backend::MemoryStore;
use netopt_core::ManualClock;

fn optimizer(
    transport: &Arc<MockTransport>,
    clock: &ManualClock,
) -> NetworkOptimizer<Arc<MockTransport>> {
    NetworkOptimizer::builder(transport.clone())
        .clock(clock.clone())
        .build()
}

#[tokio::test]
async fn entry_is_served_until_ttl_elapses() {
    let transport = Arc::new(MockTransport::new().reply("/api/events", ok("[]")));
    let clock = ManualClock::new();
    let optimizer = optimizer(&transport, &clock);
    let ttl = Duration::from_millis(5000);

    optimizer
        .fetch_optimized(Request::get("/api/events"), ttl)
        .await
        .unwrap();
    assert_eq!(transport.calls("/api/events"), 1);

    clock.advance(Duration::from_millis(4999));
    optimizer
        .fetch_optimized(Request::get("/api/events"), ttl)
        .await
        .unwrap();
    assert_eq!(transport.calls("/api/events"), 1);

    clock.advance(Duration::from_millis(1001));
    optimizer
        .fetch_optimized(Request::get("/api/events"), ttl)
        .await
        .unwrap();
    assert_eq!(transport.calls("/api/events"), 2);
}

#[tokio::test]
async fn entry_expires_exactly_at_ttl() {
    let transport = Arc::new(MockTransport::new().reply("/api/events", ok("[]")));
    let clock = ManualClock::new();
    let optimizer = optimizer(&transport, &clock);
    let ttl = Duration::from_secs(5);

    optimizer
        .fetch_optimized(Request::get("/api/events"), ttl)
        .await
        .unwrap();
    clock.advance(ttl);
    optimizer
        .fetch_optimized(Request::get("/api/events"), ttl)
        .await
        .unwrap();

    assert_eq!(transport.calls("/api/events"), 2);
}

#[tokio::test]
async fn fetch_uses_configured_default_ttl() {
    let transport = Arc::new(MockTransport::new().reply("/api/programs", ok("[]")));
    let clock = ManualClock::new();
    let config = OptimizerConfig {
        default_ttl: Duration::from_secs(30),
        ..OptimizerConfig::default()
    };
    let optimizer = NetworkOptimizer::builder(transport.clone())
        .config(config)
        .clock(clock.clone())
        .build();

    optimizer.fetch(Request::get("/api/programs")).await.unwrap();
    clock.advance(Duration::from_secs(29));
    optimizer.fetch(Request::get("/api/programs")).await.unwrap();
    assert_eq!(transport.calls("/api/programs"), 1);

    clock.advance(Duration::from_secs(2));
    optimizer.fetch(Request::get("/api/programs")).await.unwrap();
    assert_eq!(transport.calls("/api/programs"), 2);
}

#[tokio::test]
async fn stats_report_hit_rate() {
    let transport = Arc::new(MockTransport::new().reply("/api/events", ok("[]")));
    let optimizer = NetworkOptimizer::new(transport.clone());

    for _ in 0..4 {
        optimizer.fetch(Request::get("/api/events")).await.unwrap();
    }

    let stats = optimizer.stats();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.network_calls, 1);
    assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
}

#[tokio::test]
async fn invalidate_forces_a_new_call() {
    let transport = Arc::new(
        MockTransport::new()
            .reply("/api/events", ok("[]"))
            .reply("/api/programs", ok("[]")),
    );
    let optimizer = NetworkOptimizer::new(transport.clone());
    let events = Request::get("/api/events");
    let programs = Request::get("/api/programs");

    optimizer.fetch(events.clone()).await.unwrap();
    optimizer.fetch(programs.clone()).await.unwrap();

    optimizer.invalidate(&events).await;
    optimizer.fetch(events.clone()).await.unwrap();
    optimizer.fetch(programs.clone()).await.unwrap();
    assert_eq!(transport.calls("/api/events"), 2);
    assert_eq!(transport.calls("/api/programs"), 1);

    optimizer.clear_cache().await;
    optimizer.fetch(events).await.unwrap();
    optimizer.fetch(programs).await.unwrap();
    assert_eq!(transport.calls("/api/events"), 3);
    assert_eq!(transport.calls("/api/programs"), 2);
}

#[tokio::test]
async fn sweep_drops_entries_past_retention() {
    let transport = Arc::new(
        MockTransport::new()
            .reply("/api/events", ok("[]"))
            .reply("/api/programs", ok("[]")),
    );
    let clock = ManualClock::new();
    let config = OptimizerConfig {
        stale_retention: Duration::from_secs(10),
        ..OptimizerConfig::default()
    };
    let optimizer = NetworkOptimizer::builder(transport.clone())
        .config(config)
        .clock(clock.clone())
        .build();

    optimizer
        .fetch_optimized(Request::get("/api/events"), Duration::from_secs(1))
        .await
        .unwrap();
    optimizer
        .fetch_optimized(Request::get("/api/programs"), Duration::from_secs(60))
        .await
        .unwrap();

    clock.advance(Duration::from_secs(5));
    assert_eq!(optimizer.sweep_expired().await, 0);

    clock.advance(Duration::from_secs(10));
    assert_eq!(optimizer.sweep_expired().await, 1);
}

#[tokio::test]
async fn fetch_json_decodes_body() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Event {
        id: u32,
        title: String,
    }

    let transport = Arc::new(
        MockTransport::new()
            .reply("/api/events", ok(r#"[{"id":1,"title":"Meetup"}]"#))
            .reply("/api/broken", ok("not json")),
    );
    let optimizer = NetworkOptimizer::new(transport.clone());

    let events: Vec<Event> = optimizer
        .fetch_json(Request::get("/api/events"), Default::default())
        .await
        .unwrap();
    assert_eq!(
        events,
        vec![Event {
            id: 1,
            title: "Meetup".to_owned()
        }]
    );

    let err = optimizer
        .fetch_json::<Vec<Event>>(Request::get("/api/broken"), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, netopt::FetchError::Decode(_)));
}

fn session_options() -> FetchOptions {
    FetchOptions::default()
        .ttl(Duration::from_secs(1))
        .persistence(Persistence::Session)
}

#[tokio::test(start_paused = true)]
async fn sweeper_runs_until_engine_is_dropped() {
    let transport = Arc::new(MockTransport::new().reply("/api/events", ok("[]")));
    let clock = ManualClock::new();
    let session = MemoryStore::new();
    let offload = OffloadManager::with_defaults();
    let config = OptimizerConfig {
        stale_retention: Duration::from_secs(10),
        sweep_interval: None,
        ..OptimizerConfig::default()
    };
    let optimizer = NetworkOptimizer::builder(transport.clone())
        .config(config)
        .clock(clock.clone())
        .session_store(session.clone())
        .offload(offload.clone())
        .build();

    optimizer
        .fetch_with(Request::get("/api/events"), session_options())
        .await
        .unwrap();
    assert_eq!(session.len(), 1);

    let sweeper = optimizer.spawn_sweeper(Duration::from_secs(30)).unwrap();
    clock.advance(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(session.is_empty());

    // Background refreshes do not wait on the sweeper.
    assert!(offload.wait_all_timeout(Duration::from_secs(1)).await);

    drop(optimizer);
    assert!(
        tokio::time::timeout(Duration::from_secs(60), sweeper)
            .await
            .is_ok()
    );
}

#[tokio::test(start_paused = true)]
async fn default_config_reclaims_expired_entries() {
    let transport = Arc::new(MockTransport::new().reply("/api/events", ok("[]")));
    let clock = ManualClock::new();
    let session = MemoryStore::new();
    let optimizer = NetworkOptimizer::builder(transport.clone())
        .clock(clock.clone())
        .session_store(session.clone())
        .build();

    optimizer
        .fetch_with(Request::get("/api/events"), session_options())
        .await
        .unwrap();
    assert_eq!(session.len(), 1);

    let config = optimizer.config();
    let interval = config.sweep_interval.unwrap();
    clock.advance(config.stale_retention + Duration::from_secs(2));
    tokio::time::sleep(interval + Duration::from_secs(1)).await;

    assert!(session.is_empty());
}
