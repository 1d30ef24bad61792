//! Error types for store operations.

use thiserror::Error;

/// Error type for store operations.
///
/// The engine never surfaces these to its callers: a failing store is
/// treated as an empty one and the failure is logged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not related to I/O with an external system.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// Error while talking to the underlying storage (disk, quota, device).
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// Key or value (de)serialization error.
    #[error("format error: {0}")]
    FormatError(String),
}

impl StoreError {
    /// Wraps any error as an [`InternalError`](Self::InternalError).
    pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InternalError(Box::new(err))
    }

    /// Wraps any error as a [`ConnectionError`](Self::ConnectionError).
    pub fn connection(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ConnectionError(Box::new(err))
    }
}
