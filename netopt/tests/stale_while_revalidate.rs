mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockTransport, ok, status};
use netopt::{NetworkOptimizer, OptimizerConfig, Request, RetryConfig, RetryLimit};
use netopt_core::ManualClock;

const TTL: Duration = Duration::from_secs(60);

fn optimizer(
    transport: &Arc<MockTransport>,
    clock: &ManualClock,
) -> NetworkOptimizer<Arc<MockTransport>> {
    let config = OptimizerConfig {
        retry: RetryConfig {
            max_retries: RetryLimit::new(0).unwrap(),
            base_delay: Duration::from_secs(1),
        },
        ..OptimizerConfig::default()
    };
    NetworkOptimizer::builder(transport.clone())
        .config(config)
        .clock(clock.clone())
        .build()
}

#[tokio::test(start_paused = true)]
async fn stale_entry_is_served_and_refreshed() {
    let transport = Arc::new(MockTransport::new().reply("/api/events", ok("v1")));
    let clock = ManualClock::new();
    let optimizer = optimizer(&transport, &clock);

    let first = optimizer
        .smart_fetch(Request::get("/api/events"), TTL, true)
        .await
        .unwrap();
    assert_eq!(first, "v1");

    transport.set("/api/events", ok("v2"));
    clock.advance(TTL + Duration::from_secs(1));

    let stale = optimizer
        .smart_fetch(Request::get("/api/events"), TTL, true)
        .await
        .unwrap();
    assert_eq!(stale, "v1");

    optimizer.offload().wait_all().await;
    assert_eq!(transport.calls("/api/events"), 2);

    let fresh = optimizer
        .smart_fetch(Request::get("/api/events"), TTL, true)
        .await
        .unwrap();
    assert_eq!(fresh, "v2");
    assert_eq!(transport.calls("/api/events"), 2);

    let stats = optimizer.stats();
    assert_eq!(stats.stale_hits, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test(start_paused = true)]
async fn stale_entry_without_revalidation_waits_for_network() {
    let transport = Arc::new(MockTransport::new().reply("/api/events", ok("v1")));
    let clock = ManualClock::new();
    let optimizer = optimizer(&transport, &clock);

    optimizer
        .smart_fetch(Request::get("/api/events"), TTL, false)
        .await
        .unwrap();
    transport.set("/api/events", ok("v2"));
    clock.advance(TTL);

    let body = optimizer
        .smart_fetch(Request::get("/api/events"), TTL, false)
        .await
        .unwrap();
    assert_eq!(body, "v2");
    assert_eq!(optimizer.stats().stale_hits, 0);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_serving_stale_value() {
    let transport = Arc::new(MockTransport::new().reply("/api/events", ok("v1")));
    let clock = ManualClock::new();
    let optimizer = optimizer(&transport, &clock);

    optimizer
        .smart_fetch(Request::get("/api/events"), TTL, true)
        .await
        .unwrap();
    transport.set("/api/events", status(503));
    clock.advance(TTL * 2);

    let stale = optimizer
        .smart_fetch(Request::get("/api/events"), TTL, true)
        .await
        .unwrap();
    assert_eq!(stale, "v1");
    optimizer.offload().wait_all().await;

    let again = optimizer
        .smart_fetch(Request::get("/api/events"), TTL, true)
        .await
        .unwrap();
    assert_eq!(again, "v1");
    assert_eq!(optimizer.stats().failures, 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_stale_reads_refresh_once() {
    let transport = Arc::new(
        MockTransport::new()
            .delay(Duration::from_millis(100))
            .reply("/api/events", ok("v1")),
    );
    let clock = ManualClock::new();
    let optimizer = optimizer(&transport, &clock);

    optimizer
        .smart_fetch(Request::get("/api/events"), TTL, true)
        .await
        .unwrap();
    clock.advance(TTL);

    for _ in 0..3 {
        let body = optimizer
            .smart_fetch(Request::get("/api/events"), TTL, true)
            .await
            .unwrap();
        assert_eq!(body, "v1");
    }
    optimizer.offload().wait_all().await;

    assert_eq!(transport.calls("/api/events"), 2);
}
