use std::sync::Arc;

use async_trait::async_trait;

use crate::NetworkError;
use crate::request::{FetchRequest, WorkerResponse};

/// Network access of the worker.
///
/// Any received response is `Ok`, whatever its status; only a missing
/// response is an error. The worker decides on its own which statuses to
/// cache.
#[async_trait]
pub trait Network: Send + Sync {
    /// Issues `request`.
    async fn fetch(&self, request: &FetchRequest) -> Result<WorkerResponse, NetworkError>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for Arc<N> {
    async fn fetch(&self, request: &FetchRequest) -> Result<WorkerResponse, NetworkError> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<N: Network + ?Sized> Network for Box<N> {
    async fn fetch(&self, request: &FetchRequest) -> Result<WorkerResponse, NetworkError> {
        (**self).fetch(request).await
    }
}
