//! Engine transport over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use netopt_core::{Request, Transport, TransportError, TransportResponse};
use tracing::debug;
use url::Url;

use crate::DEFAULT_TIMEOUT;
use crate::client::HttpClient;
use crate::error::transport_error;

/// [`Transport`] sending through a reqwest client.
///
/// Relative request urls are resolved against the base url. Default headers
/// are sent with every call; a header set on the request replaces the default
/// of the same name.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: HttpClient,
    base_url: Option<Url>,
    headers: HeaderMap,
    timeout: Duration,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ReqwestTransport {
    /// Creates a transport over `client` with the default timeout.
    pub fn new(client: impl Into<HttpClient>) -> Self {
        Self::builder().client(client).build()
    }

    /// Creates a builder.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Returns the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn resolve(&self, url: &str) -> Result<Url, TransportError> {
        let resolved = match (Url::parse(url), &self.base_url) {
            (Ok(absolute), _) => Ok(absolute),
            (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base.join(url),
            (Err(error), _) => Err(error),
        };
        resolved.map_err(|error| TransportError::InvalidRequest(format!("invalid url {url}: {error}")))
    }

    fn prepare(&self, request: &Request) -> Result<reqwest::Request, TransportError> {
        let mut outgoing = reqwest::Request::new(request.method().clone(), self.resolve(request.url())?);
        *outgoing.timeout_mut() = Some(self.timeout);

        let headers = outgoing.headers_mut();
        headers.extend(self.headers.clone());
        headers.extend(request.headers().clone());

        let body = request.request_body();
        if let Some(content_type) = body.content_type()
            && !headers.contains_key(CONTENT_TYPE)
            && let Ok(value) = HeaderValue::from_str(content_type)
        {
            headers.insert(CONTENT_TYPE, value);
        }
        if !body.is_empty() {
            *outgoing.body_mut() = Some(body.to_bytes().into());
        }
        Ok(outgoing)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        let outgoing = self.prepare(request)?;
        let method = outgoing.method().clone();
        let url = outgoing.url().clone();

        let response = self
            .client
            .execute(outgoing)
            .await
            .map_err(|error| transport_error(error, self.timeout))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|error| transport_error(reqwest_middleware::Error::Reqwest(error), self.timeout))?;
        debug!(%method, %url, %status, bytes = body.len(), "http call");

        TransportResponse {
            status,
            headers,
            body,
        }
        .error_for_status()
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    client: Option<HttpClient>,
    base_url: Option<Url>,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ReqwestTransportBuilder {
    /// Sends through `client` instead of a fresh [`reqwest::Client`].
    pub fn client(mut self, client: impl Into<HttpClient>) -> Self {
        self.client = Some(client.into());
        self
    }

    /// Resolves relative request urls against `base_url`.
    ///
    /// Resolution follows RFC 3986: keep a trailing slash on the base url
    /// and start request paths without one to append to it.
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Adds a default header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the per-call timeout. Defaults to [`DEFAULT_TIMEOUT`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the transport.
    pub fn build(self) -> ReqwestTransport {
        ReqwestTransport {
            client: self.client.unwrap_or_default(),
            base_url: self.base_url,
            headers: self.headers,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::builder()
            .base_url(Url::parse("https://api.example.org/v2/").unwrap())
            .header("x-client", "netopt")
            .header("authorization", "Bearer default")
            .build()
    }

    #[test]
    fn relative_urls_join_the_base() {
        let transport = transport();
        assert_eq!(
            transport.resolve("events?page=2").unwrap().as_str(),
            "https://api.example.org/v2/events?page=2"
        );
        assert_eq!(
            transport.resolve("https://cdn.example.org/a.json").unwrap().as_str(),
            "https://cdn.example.org/a.json"
        );
    }

    #[test]
    fn relative_url_without_base_is_rejected() {
        let err = ReqwestTransport::default().resolve("/events").unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn request_headers_replace_defaults() {
        let request = Request::post("events", serde_json::json!({"name": "Ada"}))
            .header("authorization", "Bearer user");
        let outgoing = transport().prepare(&request).unwrap();

        let headers = outgoing.headers();
        assert_eq!(headers.get_all("authorization").iter().count(), 1);
        assert_eq!(headers["authorization"], "Bearer user");
        assert_eq!(headers["x-client"], "netopt");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(outgoing.timeout(), Some(&DEFAULT_TIMEOUT));
    }
}
