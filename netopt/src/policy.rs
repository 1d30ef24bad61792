use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RetryConfig;

/// Exponential backoff policy for transient failures.
///
/// The delay before retry number `n` (counting from zero) is
/// `base_delay * 2^n`: with the defaults that is 1s, 2s, 4s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Maximum number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after `attempts_made` failed attempts.
    pub fn delay_for_attempt(&self, attempts_made: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts_made).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self::new(u32::from(config.max_retries.get()), config.base_delay)
    }
}

/// Which store mirrors a cached entry besides the in-memory cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    /// In-memory only, lost with the engine instance.
    #[default]
    Memory,
    /// Also kept in the session-scoped store.
    Session,
    /// Also kept in the durable store.
    Durable,
}

/// Per-call options.
///
/// ```
/// use std::time::Duration;
/// use netopt::{FetchOptions, Persistence};
///
/// let options = FetchOptions::default()
///     .ttl(Duration::from_secs(30))
///     .persistence(Persistence::Session)
///     .stale_while_revalidate(true);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    ttl: Option<Duration>,
    persistence: Persistence,
    stale_while_revalidate: bool,
}

impl FetchOptions {
    /// Sets the TTL of the stored entry. Defaults to the engine's `default_ttl`.
    pub fn ttl(self, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..self
        }
    }

    /// Selects the persisted store that mirrors the entry.
    pub fn persistence(self, persistence: Persistence) -> Self {
        Self {
            persistence,
            ..self
        }
    }

    /// Serves a stale entry immediately and refreshes it in the background.
    pub fn stale_while_revalidate(self, enabled: bool) -> Self {
        Self {
            stale_while_revalidate: enabled,
            ..self
        }
    }

    /// Configured TTL, if any.
    pub fn get_ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Selected persistence.
    pub fn get_persistence(&self) -> Persistence {
        self.persistence
    }

    /// Whether stale-while-revalidate is enabled.
    pub fn is_stale_while_revalidate(&self) -> bool {
        self.stale_while_revalidate
    }
}
