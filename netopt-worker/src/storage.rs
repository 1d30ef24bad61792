//! Named response caches.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::StorageError;
use crate::request::WorkerResponse;

/// A set of named caches mapping request urls to responses.
///
/// Mirrors the host's cache storage: caches are created on first use and
/// deleted as a whole.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Creates the cache `name` if it does not exist.
    async fn open(&self, name: &str) -> Result<(), StorageError>;

    /// Names of every existing cache, sorted.
    async fn cache_names(&self) -> Result<Vec<String>, StorageError>;

    /// Deletes the cache `name`. Returns `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Looks up `key` in the cache `name`.
    async fn lookup(&self, name: &str, key: &str) -> Result<Option<WorkerResponse>, StorageError>;

    /// Stores `response` under `key` in the cache `name`, creating the cache
    /// if needed.
    async fn put(&self, name: &str, key: &str, response: WorkerResponse)
    -> Result<(), StorageError>;
}

#[async_trait]
impl<S: CacheStorage + ?Sized> CacheStorage for Arc<S> {
    async fn open(&self, name: &str) -> Result<(), StorageError> {
        (**self).open(name).await
    }

    async fn cache_names(&self) -> Result<Vec<String>, StorageError> {
        (**self).cache_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        (**self).delete(name).await
    }

    async fn lookup(&self, name: &str, key: &str) -> Result<Option<WorkerResponse>, StorageError> {
        (**self).lookup(name, key).await
    }

    async fn put(
        &self,
        name: &str,
        key: &str,
        response: WorkerResponse,
    ) -> Result<(), StorageError> {
        (**self).put(name, key, response).await
    }
}

/// In-memory [`CacheStorage`].
///
/// Cloning is cheap; clones share the same caches.
#[derive(Clone, Debug, Default)]
pub struct MemoryCacheStorage {
    caches: Arc<DashMap<String, DashMap<String, WorkerResponse>>>,
}

impl MemoryCacheStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of responses in the cache `name`.
    pub fn len(&self, name: &str) -> usize {
        self.caches.get(name).map_or(0, |cache| cache.len())
    }

    /// Returns `true` if the cache `name` holds nothing or does not exist.
    pub fn is_empty(&self, name: &str) -> bool {
        self.len(name) == 0
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<(), StorageError> {
        self.caches.entry(name.to_owned()).or_default();
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self.caches.iter().map(|cache| cache.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.caches.remove(name).is_some())
    }

    async fn lookup(&self, name: &str, key: &str) -> Result<Option<WorkerResponse>, StorageError> {
        Ok(self
            .caches
            .get(name)
            .and_then(|cache| cache.get(key).map(|response| response.value().clone())))
    }

    async fn put(
        &self,
        name: &str,
        key: &str,
        response: WorkerResponse,
    ) -> Result<(), StorageError> {
        self.caches
            .entry(name.to_owned())
            .or_default()
            .insert(key.to_owned(), response);
        Ok(())
    }
}
