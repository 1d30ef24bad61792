//! Metrics declaration and engine statistics.
//!
//! [`CacheStats`] is always available and is what
//! [`NetworkOptimizer::stats`](crate::NetworkOptimizer::stats) returns. With
//! the `metrics` feature the same events are also exported through the
//! [`metrics`](https://docs.rs/metrics) facade.

use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    // Lookup outcome metrics

    /// Track number of fresh cache hits.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "netopt_cache_hit_total",
            "Total number of fresh cache hits."
        );
        "netopt_cache_hit_total"
    };
    /// Track number of stale entries served while revalidating.
    pub static ref CACHE_STALE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "netopt_cache_stale_total",
            "Total number of stale entries served while revalidating."
        );
        "netopt_cache_stale_total"
    };
    /// Track number of cache misses.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "netopt_cache_miss_total",
            "Total number of cache misses."
        );
        "netopt_cache_miss_total"
    };
    /// Track number of callers that joined an in-flight call.
    pub static ref DEDUPLICATED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "netopt_deduplicated_total",
            "Total number of callers that joined an in-flight call."
        );
        "netopt_deduplicated_total"
    };

    // Network metrics

    /// Track number of physical transport attempts.
    pub static ref NETWORK_ATTEMPTS: &'static str = {
        metrics::describe_counter!(
            "netopt_network_attempts_total",
            "Total number of physical transport attempts."
        );
        "netopt_network_attempts_total"
    };
    /// Track number of retries after transient failures.
    pub static ref NETWORK_RETRIES: &'static str = {
        metrics::describe_counter!(
            "netopt_network_retries_total",
            "Total number of retries after transient failures."
        );
        "netopt_network_retries_total"
    };
    /// Track number of calls that ended in an error.
    pub static ref NETWORK_FAILURES: &'static str = {
        metrics::describe_counter!(
            "netopt_network_failures_total",
            "Total number of calls that ended in an error."
        );
        "netopt_network_failures_total"
    };

    // Offload manager metrics

    /// Track number of offload tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "netopt_offload_tasks_spawned_total",
            "Total number of offload tasks spawned."
        );
        "netopt_offload_tasks_spawned_total"
    };
    /// Track number of offload tasks completed.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "netopt_offload_tasks_completed_total",
            "Total number of offload tasks completed."
        );
        "netopt_offload_tasks_completed_total"
    };
    /// Track number of offload tasks that timed out.
    pub static ref OFFLOAD_TASKS_TIMEOUT: &'static str = {
        metrics::describe_counter!(
            "netopt_offload_tasks_timeout_total",
            "Total number of offload tasks that timed out."
        );
        "netopt_offload_tasks_timeout_total"
    };
    /// Track number of offload tasks deduplicated (skipped).
    pub static ref OFFLOAD_TASKS_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "netopt_offload_tasks_deduplicated_total",
            "Total number of offload tasks skipped because one was already in flight."
        );
        "netopt_offload_tasks_deduplicated_total"
    };
    /// Gauge of currently active offload tasks.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "netopt_offload_tasks_active",
            "Number of currently active offload tasks."
        );
        "netopt_offload_tasks_active"
    };
    /// Histogram of offload task duration.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "netopt_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of offload tasks in seconds."
        );
        "netopt_offload_task_duration_seconds"
    };
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    Hit,
    Stale,
    Miss,
}

/// Snapshot of the engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered by a fresh entry.
    pub hits: u64,
    /// Lookups answered by a stale entry while it was refreshed.
    pub stale_hits: u64,
    /// Lookups that needed a network call (joined or started).
    pub misses: u64,
    /// Misses that joined an already in-flight call.
    pub deduplicated: u64,
    /// Physical transport attempts, retries included.
    pub network_calls: u64,
    /// Retries after transient failures.
    pub retries: u64,
    /// Calls that ended in an error.
    pub failures: u64,
}

impl CacheStats {
    /// Share of lookups served from the cache, in `0.0..=1.0`.
    ///
    /// Returns `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let lookups = served + self.misses;
        if lookups == 0 {
            0.0
        } else {
            served as f64 / lookups as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    deduplicated: AtomicU64,
    network_calls: AtomicU64,
    retries: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    pub(crate) fn lookup(&self, outcome: Lookup) {
        let counter = match outcome {
            Lookup::Hit => &self.hits,
            Lookup::Stale => &self.stale_hits,
            Lookup::Miss => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        record_lookup(outcome);
    }

    pub(crate) fn deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(*DEDUPLICATED_COUNTER).increment(1);
    }

    pub(crate) fn network_call(&self) {
        self.network_calls.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(*NETWORK_ATTEMPTS).increment(1);
    }

    pub(crate) fn retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(*NETWORK_RETRIES).increment(1);
    }

    pub(crate) fn failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!(*NETWORK_FAILURES).increment(1);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            network_calls: self.network_calls.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Record a lookup outcome.
///
/// When the `metrics` feature is disabled, this function is a no-op.
#[cfg(feature = "metrics")]
#[inline]
fn record_lookup(outcome: Lookup) {
    let counter = match outcome {
        Lookup::Hit => *CACHE_HIT_COUNTER,
        Lookup::Stale => *CACHE_STALE_COUNTER,
        Lookup::Miss => *CACHE_MISS_COUNTER,
    };
    metrics::counter!(counter).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
fn record_lookup(_outcome: Lookup) {}
