//! Engine configuration.
//!
//! [`OptimizerConfig`] can be built in code or loaded from YAML:
//!
//! ```
//! use std::time::Duration;
//! use netopt::OptimizerConfig;
//!
//! let config = OptimizerConfig::from_yaml(
//!     r#"
//! default_ttl: 10m
//! retry:
//!   max_retries: 5
//!   base_delay: 500ms
//! request_timeout: 30s
//! "#,
//! )?;
//! assert_eq!(config.default_ttl, Duration::from_secs(600));
//! assert_eq!(config.retry.max_retries.get(), 5);
//! # Ok::<(), netopt::ConfigError>(())
//! ```

use std::time::Duration;

use bounded_integer::bounded_integer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

bounded_integer! {
    /// Number of retries after the first attempt (0-16).
    /// A value of 0 disables retrying.
    #[repr(u8)]
    pub struct RetryLimit { 0..=16 }
}

const DEFAULT_MAX_RETRIES: u8 = 3;

/// Error returned when a configuration document cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Retry settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries for transient failures.
    pub max_retries: RetryLimit,
    /// Delay before the first retry; doubles on every further retry.
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: RetryLimit::new(DEFAULT_MAX_RETRIES).unwrap_or(RetryLimit::MAX),
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Configuration of a [`NetworkOptimizer`](crate::NetworkOptimizer).
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct OptimizerConfig {
    /// TTL used when a call does not specify one (e.g. "5m", "30s").
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,
    /// Retry settings.
    pub retry: RetryConfig,
    /// Timeout for a single transport call. A timeout is retryable.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// How long an expired entry is kept for stale-while-revalidate before
    /// it may be reclaimed.
    #[serde(with = "humantime_serde")]
    pub stale_retention: Duration,
    /// Period of the background sweeper that reclaims entries past
    /// `ttl + stale_retention`. Defaults to one hour; `null` disables it.
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Option<Duration>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5 * 60),
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(45),
            stale_retention: Duration::from_secs(60 * 60),
            sweep_interval: Some(Duration::from_secs(60 * 60)),
        }
    }
}

impl OptimizerConfig {
    /// Parses a YAML document. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Serializes the configuration to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_saphyr::to_string(self).map_err(|err| ConfigError::Parse(err.to_string()))
    }
}
