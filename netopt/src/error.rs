//! Errors surfaced by the engine.

use http::StatusCode;
use netopt_core::{ErrorClass, TransportError};
use thiserror::Error;

/// Error returned by every fetch operation.
///
/// `FetchError` is `Clone`: when concurrent callers share one in-flight
/// call, each of them receives a copy of the same outcome.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The transport call failed, after retries for transient failures.
    #[error("request failed after {attempts} attempt(s): {source}")]
    Transport {
        /// Last error returned by the transport.
        #[source]
        source: TransportError,
        /// Number of physical attempts made.
        attempts: u32,
    },

    /// The body could not be decoded into the requested type.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// The background task running the call was cancelled or panicked.
    #[error("fetch task failed: {0}")]
    Task(String),
}

impl FetchError {
    /// Returns `true` when the backend looks idle or unreachable: network
    /// failures, timeouts, 5xx and 429 responses.
    ///
    /// Callers use this to render a "service is waking up" state instead of
    /// a generic error.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self.class(), Some(ErrorClass::Transient))
    }

    /// Returns `true` for an HTTP 401 response.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.class(), Some(ErrorClass::Auth))
    }

    /// Returns `true` when the request itself was rejected (any 4xx except 429).
    pub fn is_client_error(&self) -> bool {
        matches!(self.class(), Some(ErrorClass::Client | ErrorClass::Auth))
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        self.transport_error().and_then(TransportError::status)
    }

    /// Number of physical attempts made. Zero for non-transport errors.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Transport { attempts, .. } => *attempts,
            _ => 0,
        }
    }

    /// Underlying transport error, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport { source, .. } => Some(source),
            _ => None,
        }
    }

    fn class(&self) -> Option<ErrorClass> {
        self.transport_error().map(TransportError::class)
    }
}
