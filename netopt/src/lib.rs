#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # netopt
//!
//! Request cache, deduplication and retry engine for HTTP clients.
//!
//! [`NetworkOptimizer`] sits between application code and a
//! [`Transport`](netopt_core::Transport). For every logical request it
//! returns a fresh cached value when one exists, joins the identical call
//! already in flight when there is one, and otherwise issues a new call
//! that is retried with exponential backoff on transient failures.
//!
//! ## Feature Flags
//!
//! - `metrics` - Export cache and network counters through the `metrics` crate

/// Engine configuration, loadable from YAML.
pub mod config;

/// Error returned by engine calls.
pub mod error;

mod inflight;

/// Counters exposed through [`NetworkOptimizer::stats`] and, with the
/// `metrics` feature, through the `metrics` crate.
pub mod metrics;

/// Background task offloading for stale-while-revalidate refreshes,
/// preloads and the sweeper.
pub mod offload;

mod optimizer;

/// Retry policy and per-call options.
pub mod policy;

mod retry;

pub use config::{ConfigError, OptimizerConfig, RetryConfig, RetryLimit};
pub use error::FetchError;
pub use metrics::CacheStats;
pub use optimizer::{AuthFailureHook, NetworkOptimizer, NetworkOptimizerBuilder};
pub use policy::{FetchOptions, Persistence, RetryPolicy};

pub use netopt_core::{
    CacheEntry, Priority, Raw, Request, RequestBody, RequestKey, Transport, TransportError,
    TransportResponse,
};
