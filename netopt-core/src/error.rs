//! Transport error classification.
//!
//! Every transport adapter reports failures through [`TransportError`], an
//! explicit tagged union instead of message inspection. The engine only ever
//! looks at [`TransportError::class`] to decide whether to retry.
//!
//! | Condition | Class |
//! |-----------|-------|
//! | no response (DNS, connect, reset) | [`ErrorClass::Transient`] |
//! | timeout | [`ErrorClass::Transient`] |
//! | `5xx`, `429` | [`ErrorClass::Transient`] |
//! | `401` | [`ErrorClass::Auth`] |
//! | any other `4xx` | [`ErrorClass::Client`] |
//! | request could not be built (bad url) | [`ErrorClass::Client`] |

use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

/// How the engine must react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Slow, asleep or unreachable backend. Retried with backoff.
    Transient,
    /// The request itself was rejected. Surfaced immediately.
    Client,
    /// The session is no longer valid. Surfaced immediately, triggers auth teardown.
    Auth,
}

/// Failure reported by a transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// No response was received.
    #[error("network failure: {0}")]
    NetworkFailure(String),
    /// The call did not complete within the allotted time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The request could not be sent at all, e.g. its url does not parse.
    /// Retrying cannot help.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// A response with a non-success status was received.
    #[error("unexpected HTTP status {status}")]
    HttpStatus {
        /// Received status code.
        status: StatusCode,
        /// Received body, kept for error reporting.
        body: Bytes,
    },
}

impl TransportError {
    /// Shortcut for an [`HttpStatus`](Self::HttpStatus) error with an empty body.
    pub fn status_code(status: StatusCode) -> Self {
        Self::HttpStatus {
            status,
            body: Bytes::new(),
        }
    }

    /// Classifies the failure.
    pub fn class(&self) -> ErrorClass {
        match self {
            TransportError::NetworkFailure(_) | TransportError::Timeout(_) => {
                ErrorClass::Transient
            }
            TransportError::InvalidRequest(_) => ErrorClass::Client,
            TransportError::HttpStatus { status, .. } => {
                if *status == StatusCode::UNAUTHORIZED {
                    ErrorClass::Auth
                } else if *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Client
                }
            }
        }
    }

    /// Returns `true` if the failure may succeed on a later attempt.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Returns the HTTP status, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
