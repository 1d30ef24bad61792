//! Moka store implementation.

use async_trait::async_trait;
use moka::future::Cache;
use netopt_backend::{DeleteStatus, Store, StoreResult};
use netopt_core::{CacheEntry, Raw, RequestKey, StoreLabel};
use tracing::trace;

use crate::builder::{MokaStoreBuilder, NoCapacity};

/// Bounded in-memory store powered by Moka.
///
/// Reads are lock-free and writes use fine-grained locking. Unlike
/// [`MemoryStore`](netopt_backend::MemoryStore) the cache is bounded: once
/// the capacity is reached, entries are evicted according to the
/// configured [`EvictionPolicy`](crate::EvictionPolicy).
///
/// # Caveats
///
/// - Data is **not persisted**: the store is lost on process restart.
/// - Expiry follows the system clock, not the engine clock. An entry stays
///   readable (possibly stale) for `ttl + retention` after it was stored.
/// - Eviction is **best-effort**: expired entries may briefly remain readable
///   until Moka's maintenance runs.
#[derive(Clone)]
pub struct MokaStore {
    pub(crate) cache: Cache<RequestKey, CacheEntry<Raw>>,
    pub(crate) label: StoreLabel,
}

impl std::fmt::Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("label", &self.label)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl MokaStore {
    /// Creates a new builder. A capacity must be set before `build()`.
    pub fn builder() -> MokaStoreBuilder<NoCapacity> {
        MokaStoreBuilder::new()
    }

    /// Returns the underlying Moka cache.
    pub fn cache(&self) -> &Cache<RequestKey, CacheEntry<Raw>> {
        &self.cache
    }

    fn record_capacity(&self) {
        crate::metrics::record_capacity(
            self.label.as_str(),
            self.cache.entry_count(),
            self.cache.weighted_size(),
        );
    }
}

#[async_trait]
impl Store for MokaStore {
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry<Raw>>> {
        Ok(self.cache.get(key).await)
    }

    async fn write(&self, key: &RequestKey, entry: CacheEntry<Raw>) -> StoreResult<()> {
        self.cache.insert(key.clone(), entry).await;
        self.record_capacity();
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus> {
        let removed = self.cache.remove(key).await;
        self.record_capacity();
        match removed {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        trace!(store = %self.label, "cleared");
        self.record_capacity();
        Ok(())
    }

    fn label(&self) -> StoreLabel {
        self.label.clone()
    }
}
