//! Successful transport response.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::TransportError;

/// A response received from the network.
///
/// Transports return this only for successful calls; every other status is
/// reported as [`TransportError::HttpStatus`]. Use
/// [`error_for_status`](Self::error_for_status) when building one from a raw
/// client response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Fully buffered body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Creates a response with empty headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Shortcut for a `200 OK` response.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Turns any status outside `2xx`/`3xx` into [`TransportError::HttpStatus`].
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.status.is_client_error() || self.status.is_server_error() {
            Err(TransportError::HttpStatus {
                status: self.status,
                body: self.body,
            })
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_for_status_keeps_success() {
        let response = TransportResponse::ok("[]").error_for_status().unwrap();
        assert_eq!(response.body, Bytes::from_static(b"[]"));
    }

    #[test]
    fn error_for_status_reports_status() {
        let err = TransportResponse::new(StatusCode::SERVICE_UNAVAILABLE, "asleep")
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }
}
