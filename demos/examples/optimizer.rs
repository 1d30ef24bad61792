//! Request cache engine example.
//!
//! Wires a `NetworkOptimizer` over a reqwest transport with a Moka session
//! store and a FeOxDB durable store, then shows deduplication, caching,
//! prioritized batches and stale-while-revalidate against a public JSON API.
//!
//! Features shown:
//! - YAML configuration (`OptimizerConfig::from_yaml`)
//! - Concurrent identical fetches sharing one network call
//! - Durable persistence surviving a new engine instance
//! - Prioritized batches
//! - Engine statistics
//!
//! Run:
//!   cargo run -p netopt-demos --example optimizer
//!   RUST_LOG=netopt=trace cargo run -p netopt-demos --example optimizer

use std::time::Duration;

use futures::future::join_all;
use netopt::{FetchOptions, NetworkOptimizer, OptimizerConfig, Persistence, Priority, Request};
use netopt_feoxdb::FeOxDbStore;
use netopt_moka::MokaStore;
use netopt_reqwest::ReqwestTransport;
use serde::Deserialize;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
default_ttl: 1m
retry:
  max_retries: 2
  base_delay: 500ms
request_timeout: 10s
stale_retention: 10m
sweep_interval: 30s
"#;

#[derive(Debug, Deserialize)]
struct Post {
    id: u64,
    title: String,
}

fn transport() -> Result<ReqwestTransport, Box<dyn std::error::Error>> {
    Ok(ReqwestTransport::builder()
        .base_url("https://jsonplaceholder.typicode.com/".parse()?)
        .header("user-agent", "netopt-demo/0.1")
        .timeout(Duration::from_secs(10))
        .build())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,netopt=debug")),
        )
        .init();

    let config = OptimizerConfig::from_yaml(CONFIG)?;
    let dir = TempDir::new()?;
    let durable = FeOxDbStore::builder()
        .path(dir.path())
        .label("durable")
        .build()?;

    let optimizer = NetworkOptimizer::builder(transport()?)
        .config(config.clone())
        .session_store(MokaStore::builder().max_entries(1_000).label("session").build())
        .durable_store(durable.clone())
        .build();

    println!("=== Five concurrent fetches of the same resource ===");
    let fetches = (0..5).map(|_| optimizer.fetch(Request::get("posts/1")));
    let results = join_all(fetches).await;
    println!(
        "ok: {}, network calls: {}",
        results.iter().filter(|result| result.is_ok()).count(),
        optimizer.stats().network_calls
    );

    println!("\n=== Typed fetch, kept on disk ===");
    let durable_options = FetchOptions::default()
        .ttl(Duration::from_secs(300))
        .persistence(Persistence::Durable);
    let post: Post = optimizer
        .fetch_json(Request::get("posts/2"), durable_options)
        .await?;
    println!("post {}: {}", post.id, post.title);

    let restarted = NetworkOptimizer::builder(transport()?)
        .config(config)
        .durable_store(durable)
        .build();
    let again: Post = restarted
        .fetch_json(Request::get("posts/2"), durable_options)
        .await?;
    println!(
        "after restart: post {} (network calls: {})",
        again.id,
        restarted.stats().network_calls
    );

    println!("\n=== Prioritized batch ===");
    let requests = vec![
        Request::get("comments?postId=1").priority(Priority::Low),
        Request::get("users/1").priority(Priority::High),
        Request::get("albums/1"),
    ];
    for (key, result) in optimizer.prioritized(requests).await {
        match result {
            Ok(body) => println!("{key}: {} bytes", body.len()),
            Err(error) => println!("{key}: {error}"),
        }
    }

    println!("\n=== Stale while revalidate ===");
    let request = Request::get("todos/1");
    optimizer
        .smart_fetch(request.clone(), Duration::from_millis(200), true)
        .await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    optimizer
        .smart_fetch(request, Duration::from_millis(200), true)
        .await?;
    optimizer.offload().wait_all().await;

    let stats = optimizer.stats();
    println!("\n{stats:#?}");
    println!("hit rate: {:.0}%", stats.hit_rate() * 100.0);
    Ok(())
}
