//! Background task execution.
//!
//! Stale-while-revalidate refreshes, preloads and the periodic sweeper run
//! detached from the caller on an [`OffloadManager`]. Refreshes are keyed by
//! [`RequestKey`](netopt_core::RequestKey), so a second refresh of the same
//! entry is skipped while the first is still running.
//!
//! ```
//! use std::time::Duration;
//! use netopt::offload::{OffloadConfig, OffloadManager};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = OffloadManager::new(OffloadConfig::default().time_limit(Duration::from_secs(5)));
//! manager.spawn("preload", async {
//!     tracing::debug!("warming the cache");
//! });
//! manager.wait_all().await;
//! # }
//! ```

mod manager;
mod policy;

pub use manager::{OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, OnOverrun};
