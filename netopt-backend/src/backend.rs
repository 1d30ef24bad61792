use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netopt_core::{CacheEntry, Raw, RequestKey, StoreLabel};

use crate::StoreError;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Status of a delete operation.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}

/// Key-value store holding cached response bodies.
///
/// A store does not decide freshness: `read` returns whatever entry it holds,
/// valid or not, and the engine compares it against its own clock. Stores may
/// physically drop entries once they are past `ttl + retention`.
#[async_trait]
pub trait Store: Sync + Send {
    /// Reads an entry.
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry<Raw>>>;

    /// Writes an entry, replacing any previous one.
    async fn write(&self, key: &RequestKey, entry: CacheEntry<Raw>) -> StoreResult<()>;

    /// Removes an entry.
    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus>;

    /// Removes every entry.
    async fn clear(&self) -> StoreResult<()>;

    /// Physically drops entries that are past `ttl + retention` at `now`.
    ///
    /// Returns the number of dropped entries. Stores with their own eviction
    /// may leave this as a no-op.
    async fn sweep(&self, _now: DateTime<Utc>, _retention: Duration) -> StoreResult<usize> {
        Ok(0)
    }

    /// Returns the label of this store for logs and metrics.
    fn label(&self) -> StoreLabel {
        StoreLabel::new_static("store")
    }
}

#[async_trait]
impl Store for &dyn Store {
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry<Raw>>> {
        (*self).read(key).await
    }

    async fn write(&self, key: &RequestKey, entry: CacheEntry<Raw>) -> StoreResult<()> {
        (*self).write(key, entry).await
    }

    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus> {
        (*self).remove(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (*self).clear().await
    }

    async fn sweep(&self, now: DateTime<Utc>, retention: Duration) -> StoreResult<usize> {
        (*self).sweep(now, retention).await
    }

    fn label(&self) -> StoreLabel {
        (*self).label()
    }
}

#[async_trait]
impl Store for Box<dyn Store> {
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry<Raw>>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &RequestKey, entry: CacheEntry<Raw>) -> StoreResult<()> {
        (**self).write(key, entry).await
    }

    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (**self).clear().await
    }

    async fn sweep(&self, now: DateTime<Utc>, retention: Duration) -> StoreResult<usize> {
        (**self).sweep(now, retention).await
    }

    fn label(&self) -> StoreLabel {
        (**self).label()
    }
}

#[async_trait]
impl Store for Arc<dyn Store + Send + 'static> {
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry<Raw>>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &RequestKey, entry: CacheEntry<Raw>) -> StoreResult<()> {
        (**self).write(key, entry).await
    }

    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (**self).clear().await
    }

    async fn sweep(&self, now: DateTime<Utc>, retention: Duration) -> StoreResult<usize> {
        (**self).sweep(now, retention).await
    }

    fn label(&self) -> StoreLabel {
        (**self).label()
    }
}
