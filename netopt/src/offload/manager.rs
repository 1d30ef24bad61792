use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use netopt_core::RequestKey;
use smol_str::SmolStr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::{OffloadConfig, OnOverrun};

/// Identity of a background task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OffloadKey {
    /// Refresh of one cache entry. At most one runs per entry.
    Refresh(RequestKey),
    /// Any other task, numbered within its kind.
    Task {
        /// What the task does ("preload", "sweep", "asset_refresh").
        kind: SmolStr,
        /// Sequence number.
        id: u64,
    },
}

impl OffloadKey {
    /// Label used in spans and metrics.
    pub fn kind(&self) -> SmolStr {
        match self {
            OffloadKey::Refresh(_) => SmolStr::new_static("revalidate"),
            OffloadKey::Task { kind, .. } => kind.clone(),
        }
    }
}

impl From<RequestKey> for OffloadKey {
    fn from(key: RequestKey) -> Self {
        OffloadKey::Refresh(key)
    }
}

#[derive(Debug)]
struct Shared {
    config: OffloadConfig,
    running: DashMap<OffloadKey, JoinHandle<()>>,
    next_id: AtomicU64,
}

/// Runs work detached from the caller: stale-while-revalidate refreshes,
/// preloads, the sweeper and the service worker's asset refreshes.
///
/// Clones share the same task table.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    shared: Arc<Shared>,
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl OffloadManager {
    /// Creates a manager.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                running: DashMap::new(),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a manager with [`OffloadConfig::default`].
    pub fn with_defaults() -> Self {
        Self::new(OffloadConfig::default())
    }

    /// Runs `task` in the background under a fresh key of `kind`.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F) -> OffloadKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = OffloadKey::Task {
            kind: kind.into(),
            id: self.shared.next_id.fetch_add(1, Ordering::Relaxed),
        };
        self.start(key.clone(), task);
        key
    }

    /// Runs `task` in the background under `key`.
    ///
    /// Returns `false`, dropping `task`, when `key` is a refresh that is
    /// already running and refresh deduplication is on.
    pub fn spawn_with_key<K, F>(&self, key: K, task: F) -> bool
    where
        K: Into<OffloadKey>,
        F: Future<Output = ()> + Send + 'static,
    {
        let key = key.into();
        if self.shared.config.deduplicate_refreshes
            && matches!(key, OffloadKey::Refresh(_))
            && self.is_running(&key)
        {
            debug!(?key, "refresh already running, skipped");
            task_metrics::deduplicated(&key.kind());
            return false;
        }
        self.start(key, task);
        true
    }

    /// Returns `true` while the task under `key` has not finished.
    pub fn is_running(&self, key: &OffloadKey) -> bool {
        self.shared
            .running
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of tasks that have not finished.
    pub fn running_count(&self) -> usize {
        self.shared
            .running
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Aborts every running task.
    pub fn abort_all(&self) {
        self.shared.running.iter().for_each(|handle| handle.abort());
        self.shared.running.clear();
    }

    /// Waits until every task has finished, including tasks spawned while
    /// waiting. Never returns while the sweeper runs.
    pub async fn wait_all(&self) {
        loop {
            self.shared.running.retain(|_, handle| !handle.is_finished());
            if self.shared.running.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Like [`wait_all`](Self::wait_all), giving up after `limit`.
    ///
    /// Returns `true` if every task finished in time.
    pub async fn wait_all_timeout(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.wait_all()).await.is_ok()
    }

    fn start<F>(&self, key: OffloadKey, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let kind = key.kind();
        let span = info_span!("offload_task", kind = %kind, key = ?key);
        let config = self.shared.config;
        let shared = Arc::clone(&self.shared);
        let task_key = key.clone();
        let (registered, gate) = oneshot::channel::<()>();
        task_metrics::spawned(&kind);

        let handle = tokio::spawn(
            async move {
                // Hold off until the handle is in the table, or the removal
                // below could run first and leave a finished handle behind.
                let _ = gate.await;
                let started = Instant::now();
                let completed = match config.time_limit {
                    None => {
                        task.await;
                        true
                    }
                    Some(limit) => run_limited(task, limit, config.on_overrun).await,
                };
                if completed {
                    task_metrics::completed(&kind, started.elapsed());
                } else {
                    warn!(limit = ?config.time_limit, "background task cancelled");
                    task_metrics::timed_out(&kind, started.elapsed());
                }
                shared.running.remove(&task_key);
            }
            .instrument(span),
        );
        self.shared.running.insert(key, handle);
        let _ = registered.send(());
    }
}

/// Returns `false` when the task was cancelled.
async fn run_limited<F>(task: F, limit: Duration, on_overrun: OnOverrun) -> bool
where
    F: Future<Output = ()>,
{
    match on_overrun {
        OnOverrun::Cancel => tokio::time::timeout(limit, task).await.is_ok(),
        OnOverrun::Warn => {
            let started = Instant::now();
            task.await;
            let elapsed = started.elapsed();
            if elapsed > limit {
                warn!(
                    elapsed_ms = elapsed.as_millis(),
                    limit_ms = limit.as_millis(),
                    "background task overran its time limit"
                );
            }
            true
        }
    }
}

impl netopt_core::Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }
}

#[cfg(feature = "metrics")]
mod task_metrics {
    use std::time::Duration;

    use crate::metrics::{
        OFFLOAD_TASK_DURATION, OFFLOAD_TASKS_ACTIVE, OFFLOAD_TASKS_COMPLETED,
        OFFLOAD_TASKS_DEDUPLICATED, OFFLOAD_TASKS_SPAWNED, OFFLOAD_TASKS_TIMEOUT,
    };

    pub(super) fn spawned(kind: &str) {
        metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "kind" => kind.to_owned()).increment(1);
        metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_owned()).increment(1.0);
    }

    pub(super) fn deduplicated(kind: &str) {
        metrics::counter!(*OFFLOAD_TASKS_DEDUPLICATED, "kind" => kind.to_owned()).increment(1);
    }

    pub(super) fn completed(kind: &str, elapsed: Duration) {
        metrics::counter!(*OFFLOAD_TASKS_COMPLETED, "kind" => kind.to_owned()).increment(1);
        finished(kind, elapsed);
    }

    pub(super) fn timed_out(kind: &str, elapsed: Duration) {
        metrics::counter!(*OFFLOAD_TASKS_TIMEOUT, "kind" => kind.to_owned()).increment(1);
        finished(kind, elapsed);
    }

    fn finished(kind: &str, elapsed: Duration) {
        metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_owned()).decrement(1.0);
        metrics::histogram!(*OFFLOAD_TASK_DURATION, "kind" => kind.to_owned())
            .record(elapsed.as_secs_f64());
    }
}

#[cfg(not(feature = "metrics"))]
mod task_metrics {
    use std::time::Duration;

    pub(super) fn spawned(_kind: &str) {}
    pub(super) fn deduplicated(_kind: &str) {}
    pub(super) fn completed(_kind: &str, _elapsed: Duration) {}
    pub(super) fn timed_out(_kind: &str, _elapsed: Duration) {}
}
