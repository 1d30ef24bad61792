use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::Request;
use crate::response::TransportResponse;

/// Trait for issuing physical HTTP calls on behalf of the engine.
///
/// Implementations must report every failure through [`TransportError`]:
/// connection problems as `NetworkFailure`, deadline overruns as `Timeout`,
/// and any non-success status as `HttpStatus`. The engine never inspects
/// error messages.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use netopt_core::{Request, Transport, TransportError, TransportResponse};
///
/// struct Static(&'static str);
///
/// #[async_trait]
/// impl Transport for Static {
///     async fn send(&self, _request: &Request) -> Result<TransportResponse, TransportError> {
///         Ok(TransportResponse::ok(self.0))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues one physical call.
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError>;
}

/// Boxed transport for dynamic dispatch.
pub type BoxTransport = Box<dyn Transport>;

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}
