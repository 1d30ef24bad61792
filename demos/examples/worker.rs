//! Service worker example.
//!
//! Drives a `ServiceWorker` the way a host runtime would: install, activate,
//! then forward fetch, push and sync events. Network calls go through
//! `ReqwestNetwork`; caches live in memory.
//!
//! Run:
//!   cargo run -p netopt-demos --example worker
//!   RUST_LOG=netopt_worker=trace cargo run -p netopt-demos --example worker

use netopt::offload::OffloadManager;
use netopt_reqwest::ReqwestNetwork;
use netopt_worker::{
    BACKGROUND_SYNC_TAG, FetchOutcome, FetchRequest, MemoryCacheStorage, ServiceWorker,
    WorkerConfig,
};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
origin: https://www.rust-lang.org/
version: v1
precache:
  - /
  - /static/images/rust-logo-blk.svg
shell: /
fallback_image: /static/images/rust-logo-blk.svg
allow_list:
  - host: fonts.googleapis.com
    placeholder: empty_css
notification:
  title: Rust
  url: /learn
"#;

fn describe(url: &str, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Passthrough(reason) => println!("{url}: passthrough ({reason:?})"),
        FetchOutcome::Respond { response, source } => println!(
            "{url}: {} from {source:?}, {} bytes",
            response.status,
            response.body.len()
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,netopt_worker=debug")),
        )
        .init();

    let storage = MemoryCacheStorage::new();
    let offload = OffloadManager::with_defaults();
    let worker = ServiceWorker::new(
        WorkerConfig::from_yaml(CONFIG)?,
        storage.clone(),
        ReqwestNetwork::default(),
        offload.clone(),
    );

    println!("=== Lifecycle ===");
    let installed = worker.install().await?;
    println!("installed {:?}, skipped {:?}", installed.cached, installed.failed);
    let activated = worker.activate().await?;
    println!("activated, deleted caches: {:?}", activated.deleted);

    println!("\n=== Fetch events ===");
    let requests = [
        FetchRequest::navigate("https://www.rust-lang.org/learn")?,
        FetchRequest::get("https://www.rust-lang.org/static/images/rust-logo-blk.svg")?,
        FetchRequest::get("https://www.rust-lang.org/static/images/rust-logo-blk.svg")?,
        FetchRequest::get("https://fonts.googleapis.com/css2?family=Fira+Sans")?,
        FetchRequest::get("https://analytics.example.com/collect")?,
    ];
    for request in &requests {
        let outcome = worker.handle_fetch(request).await;
        describe(request.url().as_str(), &outcome);
    }
    offload.wait_all().await;
    println!(
        "dynamic cache entries: {}",
        storage.len(&worker.config().dynamic_cache_name())
    );

    println!("\n=== Push, click, sync ===");
    let notification = worker.handle_push(Some(br#"{"title":"Rust 2.0","body":"Not really."}"#));
    println!("{notification:#?}");
    println!("click: {:?}", worker.handle_notification_click(&notification));
    println!("sync: {:?}", worker.handle_sync(BACKGROUND_SYNC_TAG));
    Ok(())
}
