use thiserror::Error;

use crate::worker::LifecycleState;

/// Failure of a cache storage operation.
///
/// Fetch handling swallows these: a failed cache write never fails the
/// fetch, and a failed read counts as a miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Storage is disabled or was torn down by the host.
    #[error("cache storage unavailable: {0}")]
    Unavailable(String),
    /// The origin ran out of storage quota.
    #[error("cache storage quota exceeded")]
    QuotaExceeded,
}

/// Failure of a network fetch. HTTP error statuses are not failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// No response was received.
    #[error("network request failed: {0}")]
    Failed(String),
    /// The request did not complete in time.
    #[error("network request timed out")]
    Timeout,
}

/// Failure to load a [`WorkerConfig`](crate::WorkerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid YAML or does not match the schema.
    #[error("invalid worker configuration: {0}")]
    Parse(String),
    /// The configuration parsed but is unusable.
    #[error("invalid worker configuration: {0}")]
    Invalid(String),
}

/// Failure of a lifecycle transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerError {
    /// The transition is not allowed from the current state.
    #[error("cannot {action} while {state:?}")]
    InvalidState {
        /// Attempted transition.
        action: &'static str,
        /// State the worker was in.
        state: LifecycleState,
    },
    /// Cache storage failed in a way the lifecycle cannot recover from.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
