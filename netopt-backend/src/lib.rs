//! Traits and structs for netopt store interaction.
//!
//! The engine keeps every cached response in a [`Store`]: the default
//! [`MemoryStore`] lives for as long as the engine instance, while
//! session-scoped and durable stores (see `netopt-moka` and `netopt-feoxdb`)
//! mirror selected entries. If you want to implement your own store, you are
//! in the right place.
mod backend;
mod error;
mod key;
mod memory;

pub use backend::{DeleteStatus, Store, StoreResult};
pub use error::StoreError;
pub use key::KeyFormat;
pub use memory::MemoryStore;
