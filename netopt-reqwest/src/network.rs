//! Service worker network over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use netopt_worker::{FetchRequest, Network, NetworkError, WorkerResponse};
use tracing::debug;

use crate::DEFAULT_TIMEOUT;
use crate::client::HttpClient;
use crate::error::network_error;

/// [`Network`] sending through a reqwest client.
///
/// Every received response is returned as is, including `4xx` and `5xx`; the
/// worker decides what it caches.
#[derive(Debug, Clone)]
pub struct ReqwestNetwork {
    client: HttpClient,
    timeout: Duration,
}

impl Default for ReqwestNetwork {
    fn default() -> Self {
        Self::new(HttpClient::default())
    }
}

impl ReqwestNetwork {
    /// Creates a network over `client` with the default timeout.
    pub fn new(client: impl Into<HttpClient>) -> Self {
        Self {
            client: client.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

#[async_trait]
impl Network for ReqwestNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<WorkerResponse, NetworkError> {
        let mut outgoing = reqwest::Request::new(request.method().clone(), request.url().clone());
        *outgoing.timeout_mut() = Some(self.timeout);
        outgoing.headers_mut().extend(request.headers().clone());

        let response = self.client.execute(outgoing).await.map_err(network_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|error| network_error(reqwest_middleware::Error::Reqwest(error)))?;
        debug!(url = %request.url(), %status, "worker network call");

        Ok(WorkerResponse {
            status,
            headers,
            body,
        })
    }
}
