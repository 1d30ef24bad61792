//! Metrics example.
//!
//! Installs a Prometheus recorder, runs a few fetches through the engine and
//! prints the rendered metrics.
//!
//! Run:
//!   cargo run -p netopt-demos --example observability --features observability

use std::time::Duration;

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use netopt::{NetworkOptimizer, Request};
use netopt_reqwest::ReqwestTransport;
use tracing_subscriber::EnvFilter;

fn init_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    const EXPONENTIAL_SECONDS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

    Ok(PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("netopt_offload_task_duration_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )?
        .install_recorder()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .init();
    let metrics = init_metrics()?;

    let transport = ReqwestTransport::builder()
        .base_url("https://jsonplaceholder.typicode.com/".parse()?)
        .build();
    let optimizer = NetworkOptimizer::new(transport);

    for _ in 0..3 {
        optimizer.fetch(Request::get("posts/1")).await?;
    }
    optimizer.preload(["posts/2", "posts/3"]);
    optimizer
        .offload()
        .wait_all_timeout(Duration::from_secs(10))
        .await;
    if let Err(error) = optimizer.fetch(Request::get("posts/does-not-exist")).await {
        println!("expected failure: {error}");
    }

    println!("{}", metrics.render());
    Ok(())
}
