//! Unbounded in-memory store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use netopt_core::{CacheEntry, Raw, RequestKey, StoreLabel};
use tracing::debug;

use crate::{DeleteStatus, Store, StoreResult};

/// In-memory store backed by a concurrent hash map.
///
/// This is the engine's default primary cache. It never evicts on its own:
/// expired entries stay readable (for stale-while-revalidate) until a
/// [`sweep`](Store::sweep) drops them.
///
/// Cloning is cheap; clones share the same map.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    entries: Arc<DashMap<RequestKey, CacheEntry<Raw>>>,
    label: StoreLabel,
}

impl MemoryStore {
    /// Creates an empty store labelled `memory`.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            label: StoreLabel::new_static("memory"),
        }
    }

    /// Sets the label used in logs and metrics.
    pub fn with_label(self, label: impl Into<StoreLabel>) -> Self {
        Self {
            label: label.into(),
            ..self
        }
    }

    /// Number of physically held entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry<Raw>>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn write(&self, key: &RequestKey, entry: CacheEntry<Raw>) -> StoreResult<()> {
        self.entries.insert(key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus> {
        match self.entries.remove(key) {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.clear();
        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>, retention: Duration) -> StoreResult<usize> {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.is_reclaimable_at(now, retention));
        let dropped = before.saturating_sub(self.entries.len());
        if dropped > 0 {
            debug!(store = %self.label, dropped, "swept expired entries");
        }
        Ok(dropped)
    }

    fn label(&self) -> StoreLabel {
        self.label.clone()
    }
}
