//! Session-scoped store for netopt, powered by [Moka](https://docs.rs/moka).
//!
//! [`MokaStore`] keeps entries in a bounded, concurrent in-memory cache that
//! lives as long as the process (the "session"). Entries are physically
//! evicted once they are past `ttl + retention`, or earlier when the
//! capacity limit is reached.
//!
//! ```
//! use netopt_moka::MokaStore;
//!
//! let store = MokaStore::builder()
//!     .label("session")
//!     .max_entries(10_000)
//!     .build();
//! ```
#![warn(missing_docs)]

mod backend;
mod builder;
pub mod metrics;

pub use backend::MokaStore;
pub use builder::{ByteCapacity, EntryCapacity, MokaStoreBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
