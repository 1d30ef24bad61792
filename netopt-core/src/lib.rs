#![warn(missing_docs)]
//! # netopt-core
//!
//! Core traits and types for the netopt request cache, deduplication and
//! retry engine.
//!
//! This crate holds the vocabulary shared by every other netopt crate so that
//! stores, transports and the engine itself can evolve independently:
//!
//! - **Identify** a logical request ([`Request`], [`RequestKey`])
//! - **Describe** what came back ([`TransportResponse`], [`TransportError`])
//! - **Store** a value with its freshness window ([`CacheEntry`])
//! - **Tell time** in a way tests can control ([`Clock`])
//! - **Call** the network ([`Transport`])
//! - **Execute** background tasks ([`Offload`])
//!
//! ## Feature Flags
//!
//! - `test-helpers` - Enable [`ManualClock`](clock::ManualClock) for deterministic TTL tests
//!

pub mod clock;
pub mod error;
pub mod key;
pub mod label;
pub mod offload;
pub mod request;
pub mod response;
pub mod transport;
pub mod value;

pub use clock::{Clock, SharedClock, SystemClock};
#[cfg(feature = "test-helpers")]
pub use clock::ManualClock;
pub use error::{ErrorClass, TransportError};
pub use key::{RequestKey, derive_key};
pub use label::StoreLabel;
pub use offload::{DisabledOffload, Offload};
pub use request::{Priority, Request, RequestBody};
pub use response::TransportResponse;
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use transport::{BoxTransport, Transport};
pub use value::{CacheEntry, EntryState};

/// Raw byte data type used for cached response bodies.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
