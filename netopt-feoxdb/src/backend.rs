use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bincode::{
    config::standard as bincode_config,
    serde::{decode_from_slice, encode_to_vec},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use feoxdb::{FeoxError, FeoxStore};
use netopt_backend::{DeleteStatus, KeyFormat, Store, StoreError, StoreResult};
use netopt_core::{CacheEntry, Raw, RequestKey, StoreLabel};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::FeOxDbError;

const GENERATION_KEY: &[u8] = b"netopt:generation";
const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

#[derive(Serialize, Deserialize)]
struct SerializableEntry {
    #[serde(with = "serde_bytes")]
    data: Vec<u8>,
    stored_at: DateTime<Utc>,
    ttl_ms: u64,
}

impl From<CacheEntry<Raw>> for SerializableEntry {
    fn from(entry: CacheEntry<Raw>) -> Self {
        Self {
            data: entry.value().to_vec(),
            stored_at: entry.stored_at(),
            ttl_ms: u64::try_from(entry.ttl().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl From<SerializableEntry> for CacheEntry<Raw> {
    fn from(entry: SerializableEntry) -> Self {
        CacheEntry::new(
            Bytes::from(entry.data),
            entry.stored_at,
            Duration::from_millis(entry.ttl_ms),
        )
    }
}

/// Disk-backed durable store using FeOxDB.
///
/// Use this for entries that must survive restarts. For a bounded store
/// that lives only as long as the process, prefer `MokaStore`.
///
/// ```no_run
/// use netopt_feoxdb::FeOxDbStore;
///
/// let store = FeOxDbStore::builder()
///     .path("/var/cache/netopt")
///     .max_file_size(1024 * 1024 * 1024)
///     .build()?;
/// # Ok::<(), netopt_feoxdb::FeOxDbError>(())
/// ```
///
/// ## Clearing
///
/// FeOxDB has no bulk delete, so keys carry a generation prefix. `clear`
/// bumps the persisted generation: older entries become unreachable at once
/// and are reclaimed by their TTL.
///
/// Cloning is cheap; clones share the same underlying database.
#[derive(Clone)]
pub struct FeOxDbStore {
    store: Arc<FeoxStore>,
    generation: Arc<AtomicU64>,
    retention: Duration,
    label: StoreLabel,
}

impl std::fmt::Debug for FeOxDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeOxDbStore")
            .field("label", &self.label)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("retention", &self.retention)
            .finish()
    }
}

impl FeOxDbStore {
    /// Starts building a new store.
    pub fn builder() -> FeOxDbStoreBuilder {
        FeOxDbStoreBuilder::default()
    }

    /// Store without a backing file.
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        Self::builder().build()
    }

    /// Writes buffered entries out to the database file.
    pub fn flush(&self) {
        self.store.flush();
    }

    fn storage_key(&self, key: &RequestKey) -> StoreResult<Vec<u8>> {
        let generation = self.generation.load(Ordering::Acquire);
        let mut bytes = generation.to_be_bytes().to_vec();
        bytes.extend(KeyFormat::Bitcode.serialize(key)?);
        Ok(bytes)
    }

    /// Physical lifetime in seconds, counted from the write. It does not
    /// look at the wall clock: `stored_at` comes from the engine's clock.
    fn time_to_live(&self, entry: &CacheEntry<Raw>) -> u64 {
        let lifetime = entry.ttl().saturating_add(self.retention);
        // FeOxDB treats a zero ttl as "already expired".
        lifetime.as_secs().max(1)
    }
}

/// Builder for [`FeOxDbStore`].
#[derive(Debug)]
pub struct FeOxDbStoreBuilder {
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    retention: Duration,
    label: StoreLabel,
}

impl Default for FeOxDbStoreBuilder {
    fn default() -> Self {
        Self {
            path: None,
            max_file_size: None,
            max_memory: None,
            retention: DEFAULT_RETENTION,
            label: StoreLabel::new_static("feoxdb"),
        }
    }
}

impl FeOxDbStoreBuilder {
    /// Database file location. A directory gets a `netopt.db` file inside it.
    ///
    /// Unset, the store is memory-only and forgets everything on drop.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Size of the preallocated database file. Writes past it fail.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Memory cap. Nothing is evicted to make room: writes over the cap fail.
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// How long an entry is kept after its ttl has elapsed. Default: one hour.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Identifies this store in logs and metrics.
    pub fn label(mut self, label: impl Into<StoreLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Opens the store.
    ///
    /// Fails if the database file can't be opened or its generation marker
    /// is corrupted.
    pub fn build(self) -> Result<FeOxDbStore, FeOxDbError> {
        let mut builder = FeoxStore::builder().enable_ttl(true);

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push("netopt.db");
            }
            builder = builder.device_path(path.to_string_lossy().to_string());
        }

        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }

        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }

        let store = builder.build()?;
        let generation = match store.get(GENERATION_KEY) {
            Ok(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| FeOxDbError::CorruptedGeneration(bytes.len()))?;
                u64::from_be_bytes(raw)
            }
            Err(FeoxError::KeyNotFound) => 0,
            Err(err) => return Err(err.into()),
        };

        Ok(FeOxDbStore {
            store: Arc::new(store),
            generation: Arc::new(AtomicU64::new(generation)),
            retention: self.retention,
            label: self.label,
        })
    }
}

#[async_trait]
impl Store for FeOxDbStore {
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry<Raw>>> {
        let store = self.store.clone();
        let key_bytes = self.storage_key(key)?;

        tokio::task::spawn_blocking(move || match store.get(&key_bytes) {
            Ok(encoded) => {
                let (serializable, _): (SerializableEntry, _) =
                    decode_from_slice(&encoded, bincode_config()).map_err(StoreError::internal)?;
                Ok(Some(serializable.into()))
            }
            Err(FeoxError::KeyNotFound) => Ok(None),
            Err(err) => Err(StoreError::connection(err)),
        })
        .await
        .map_err(StoreError::internal)?
    }

    async fn write(&self, key: &RequestKey, entry: CacheEntry<Raw>) -> StoreResult<()> {
        let store = self.store.clone();
        let key_bytes = self.storage_key(key)?;
        let ttl_secs = self.time_to_live(&entry);

        let serializable = SerializableEntry::from(entry);
        let value_bytes =
            encode_to_vec(&serializable, bincode_config()).map_err(StoreError::internal)?;

        tokio::task::spawn_blocking(move || {
            store
                .insert_with_ttl(&key_bytes, &value_bytes, ttl_secs)
                .map_err(StoreError::connection)?;
            Ok(())
        })
        .await
        .map_err(StoreError::internal)?
    }

    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus> {
        let store = self.store.clone();
        let key_bytes = self.storage_key(key)?;

        tokio::task::spawn_blocking(move || {
            if store.contains_key(&key_bytes) {
                store.delete(&key_bytes).map_err(StoreError::connection)?;
                Ok(DeleteStatus::Deleted(1))
            } else {
                Ok(DeleteStatus::Missing)
            }
        })
        .await
        .map_err(StoreError::internal)?
    }

    async fn clear(&self) -> StoreResult<()> {
        let store = self.store.clone();
        let next = self.generation.fetch_add(1, Ordering::AcqRel).wrapping_add(1);

        tokio::task::spawn_blocking(move || {
            store
                .insert(GENERATION_KEY, &next.to_be_bytes())
                .map_err(StoreError::connection)?;
            Ok::<_, StoreError>(())
        })
        .await
        .map_err(StoreError::internal)??;

        debug!(store = %self.label, generation = next, "durable store cleared");
        Ok(())
    }

    fn label(&self) -> StoreLabel {
        self.label.clone()
    }
}
