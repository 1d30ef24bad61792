use std::time::Duration;

use netopt_core::TransportError;
use netopt_worker::NetworkError;

fn is_timeout(error: &reqwest_middleware::Error) -> bool {
    matches!(error, reqwest_middleware::Error::Reqwest(error) if error.is_timeout())
}

pub(crate) fn transport_error(error: reqwest_middleware::Error, timeout: Duration) -> TransportError {
    if is_timeout(&error) {
        TransportError::Timeout(timeout)
    } else {
        TransportError::NetworkFailure(error.to_string())
    }
}

pub(crate) fn network_error(error: reqwest_middleware::Error) -> NetworkError {
    if is_timeout(&error) {
        NetworkError::Timeout
    } else {
        NetworkError::Failed(error.to_string())
    }
}
