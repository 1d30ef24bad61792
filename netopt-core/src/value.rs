//! Cached value types with freshness metadata.
//!
//! A [`CacheEntry`] wraps a value with the instant it was stored and the
//! time-to-live it was stored with.
//!
//! ## Freshness vs Retention
//!
//! An entry is **valid** while `now < stored_at + ttl`. Past that point it is
//! logically absent for ordinary lookups (lazy expiry), but stores may keep
//! it around for a retention window so that stale-while-revalidate lookups
//! can still serve it.
//!
//! ```
//! use netopt_core::{CacheEntry, EntryState};
//! use chrono::Utc;
//! use std::time::Duration;
//!
//! let stored_at = Utc::now();
//! let entry = CacheEntry::new("events", stored_at, Duration::from_secs(5));
//!
//! assert!(entry.is_valid_at(stored_at + chrono::Duration::seconds(4)));
//! assert!(!entry.is_valid_at(stored_at + chrono::Duration::seconds(5)));
//! assert_eq!(
//!     entry.state_at(stored_at + chrono::Duration::seconds(6)),
//!     EntryState::Stale
//! );
//! ```

use std::mem::size_of;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Raw;

/// Freshness of an entry at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Within its time-to-live.
    Fresh,
    /// Past its time-to-live; served only by stale-while-revalidate lookups.
    Stale,
}

/// A cached value with its storage time and time-to-live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    value: T,
    stored_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// Creates a new entry.
    pub fn new(value: T, stored_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    /// Returns a reference to the cached value.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns when the value was stored.
    #[inline]
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Returns the time-to-live the value was stored with.
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the first instant at which the entry is no longer valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        add_saturating(self.stored_at, self.ttl)
    }

    /// Returns `true` iff `now < stored_at + ttl`.
    #[inline]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    /// Returns the freshness of the entry at `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> EntryState {
        if self.is_valid_at(now) {
            EntryState::Fresh
        } else {
            EntryState::Stale
        }
    }

    /// Time left before the entry stops being valid, `None` once expired.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.expires_at() - now)
            .to_std()
            .ok()
            .filter(|left| !left.is_zero())
    }

    /// Returns `true` if the entry is past its ttl plus `retention`
    /// and may be physically removed.
    pub fn is_reclaimable_at(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now >= add_saturating(self.expires_at(), retention)
    }

    /// Consumes the entry and returns the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Maps the value, keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            value: f(self.value),
            stored_at: self.stored_at,
            ttl: self.ttl,
        }
    }
}

impl CacheEntry<Raw> {
    /// Returns the estimated memory usage of this entry in bytes.
    pub fn memory_size(&self) -> usize {
        size_of::<Self>() + self.value.len()
    }
}

fn add_saturating(instant: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|delta| instant.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
