//! Builder for configuring [`MokaStore`].

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use netopt_core::{CacheEntry, Raw, RequestKey, StoreLabel};

use crate::backend::MokaStore;

const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);
// Moka rejects deadlines too far in the future.
const MAX_TIME_TO_LIVE: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Expiration policy: `ttl + retention` after each write.
///
/// Entries outlive their ttl by `retention` so that stale data can still be
/// served while a refresh is in flight.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Expiration {
    retention: Duration,
}

impl Expiry<RequestKey, CacheEntry<Raw>> for Expiration {
    fn expire_after_create(
        &self,
        _key: &RequestKey,
        value: &CacheEntry<Raw>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.time_to_live(value))
    }

    fn expire_after_update(
        &self,
        _key: &RequestKey,
        value: &CacheEntry<Raw>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // Moka's default keeps the old deadline; a rewrite must restart it.
        Some(self.time_to_live(value))
    }
}

impl Expiration {
    // Counted from insertion, so entries written under a manual clock
    // still get their full lifetime.
    fn time_to_live(&self, value: &CacheEntry<Raw>) -> Duration {
        value
            .ttl()
            .saturating_add(self.retention)
            .min(MAX_TIME_TO_LIVE)
    }
}

/// Marker type: capacity has not been configured yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
///
/// The byte count is approximate: it adds the key and entry
/// `memory_size()` estimates.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for creating and configuring a [`MokaStore`].
///
/// Capacity is required and set with exactly one of
/// [`max_entries`](Self::max_entries) or [`max_bytes`](Self::max_bytes);
/// `build()` is only available afterwards.
///
/// ```
/// use std::time::Duration;
/// use netopt_moka::MokaStore;
///
/// let store = MokaStore::builder()
///     .max_bytes(50 * 1024 * 1024)
///     .retention(Duration::from_secs(600))
///     .build();
/// ```
pub struct MokaStoreBuilder<Cap> {
    capacity: Cap,
    label: StoreLabel,
    retention: Duration,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaStoreBuilder<NoCapacity> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: StoreLabel::new_static("moka"),
            retention: DEFAULT_RETENTION,
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of entries the store can hold.
    pub fn max_entries(self, capacity: u64) -> MokaStoreBuilder<EntryCapacity> {
        self.with_capacity(EntryCapacity(capacity))
    }

    /// Sets the approximate memory budget in bytes.
    pub fn max_bytes(self, bytes: u64) -> MokaStoreBuilder<ByteCapacity> {
        self.with_capacity(ByteCapacity(bytes))
    }

    fn with_capacity<Cap>(self, capacity: Cap) -> MokaStoreBuilder<Cap> {
        MokaStoreBuilder {
            capacity,
            label: self.label,
            retention: self.retention,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaStoreBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaStoreBuilder<Cap> {
    /// Sets the label used in logs and metrics.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<StoreLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets how long an entry is kept after its ttl has elapsed.
    ///
    /// # Default
    ///
    /// One hour.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Sets the eviction policy.
    ///
    /// # Default
    ///
    /// - entry capacity: [`EvictionPolicy::tiny_lfu()`]
    /// - byte capacity: [`EvictionPolicy::lru()`], since TinyLFU admission can
    ///   reject a heavy entry even when eviction could make room
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaStoreBuilder<EntryCapacity> {
    /// Builds the store with entry-count based capacity.
    pub fn build(self) -> MokaStore {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let cache: Cache<RequestKey, CacheEntry<Raw>> = CacheBuilder::new(self.capacity.0)
            .eviction_policy(policy)
            .expire_after(Expiration {
                retention: self.retention,
            })
            .build();

        MokaStore {
            cache,
            label: self.label,
        }
    }
}

impl MokaStoreBuilder<ByteCapacity> {
    /// Builds the store with byte-based capacity.
    pub fn build(self) -> MokaStore {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<RequestKey, CacheEntry<Raw>> = CacheBuilder::new(self.capacity.0)
            .weigher(byte_weigher)
            .eviction_policy(policy)
            .expire_after(Expiration {
                retention: self.retention,
            })
            .build();

        MokaStore {
            cache,
            label: self.label,
        }
    }
}

fn byte_weigher(key: &RequestKey, value: &CacheEntry<Raw>) -> u32 {
    u32::try_from(key.memory_size() + value.memory_size()).unwrap_or(u32::MAX)
}
