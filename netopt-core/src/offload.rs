//! Offload trait for background task execution.
//!
//! Stale-while-revalidate refreshes, cache warm-ups and the service worker's
//! background asset re-fetches all run detached from the caller. This module
//! provides the [`Offload`] trait those components are generic over.

use std::future::Future;

use smol_str::SmolStr;

/// Trait for spawning background tasks.
///
/// The primary implementation is `OffloadManager` in the `netopt` crate,
/// which adds per-key deduplication, timeouts and metrics.
///
/// Implementors should use `Arc` internally so that clones share state.
///
/// # Example
///
/// ```ignore
/// use netopt_core::Offload;
///
/// fn refresh_later<O: Offload>(offload: &O, url: String) {
///     offload.spawn("revalidate", async move {
///         tracing::debug!(%url, "refreshing in background");
///     });
/// }
/// ```
pub trait Offload: Send + Sync + Clone {
    /// Spawn a future to be executed in the background.
    ///
    /// * `kind` - A label categorizing the task (e.g. "revalidate", "preload").
    ///   Used for metrics and tracing.
    /// * `future` - The work to run. Its outcome is never reported to the caller.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Offload that drops every task without running it.
///
/// Useful when background refreshes must not happen, e.g. in tests that
/// assert on an exact number of network calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOffload;

impl Offload for DisabledOffload {
    fn spawn<F>(&self, _kind: impl Into<SmolStr>, _future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
    }
}
