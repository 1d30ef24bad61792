//! Client wrapper accepting plain and middleware-wrapped reqwest clients.

use reqwest::{Request, Response};
use reqwest_middleware::ClientWithMiddleware;

/// The reqwest client a transport sends through.
///
/// Use [`Middleware`](HttpClient::Middleware) to stack tracing, retry or
/// caching middleware from the `reqwest-middleware` ecosystem in front of the
/// network.
#[derive(Debug, Clone)]
pub enum HttpClient {
    /// A plain client.
    Plain(reqwest::Client),
    /// A client with a middleware chain.
    Middleware(ClientWithMiddleware),
}

impl Default for HttpClient {
    fn default() -> Self {
        HttpClient::Plain(reqwest::Client::new())
    }
}

impl From<reqwest::Client> for HttpClient {
    fn from(client: reqwest::Client) -> Self {
        HttpClient::Plain(client)
    }
}

impl From<ClientWithMiddleware> for HttpClient {
    fn from(client: ClientWithMiddleware) -> Self {
        HttpClient::Middleware(client)
    }
}

impl HttpClient {
    pub(crate) async fn execute(&self, request: Request) -> reqwest_middleware::Result<Response> {
        match self {
            HttpClient::Plain(client) => client
                .execute(request)
                .await
                .map_err(reqwest_middleware::Error::Reqwest),
            HttpClient::Middleware(client) => client.execute(request).await,
        }
    }
}
