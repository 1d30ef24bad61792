//! Durable store for netopt backed by [FeOxDB](https://docs.rs/feoxdb).
//!
//! [`FeOxDbStore`] survives process restarts when given a path and mirrors
//! the entries the engine marks as durable. Expired entries are reclaimed by
//! FeOxDB's own per-key TTL once `ttl + retention` has elapsed.
#![warn(missing_docs)]

mod backend;
mod error;

pub use backend::{FeOxDbStore, FeOxDbStoreBuilder};
pub use error::FeOxDbError;
