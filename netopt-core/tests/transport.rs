use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use http::StatusCode;
use netopt_core::{
    BoxTransport, ErrorClass, Request, Transport, TransportError, TransportResponse,
};

#[derive(Default)]
struct CountingTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.url() == "/missing" {
            return TransportResponse::new(StatusCode::NOT_FOUND, "").error_for_status();
        }
        Ok(TransportResponse::ok(request.url().to_owned()))
    }
}

#[tokio::test]
async fn arc_transport_delegates() {
    let inner = Arc::new(CountingTransport::default());
    let transport: Arc<dyn Transport> = inner.clone();

    let response = transport.send(&Request::get("/api/events")).await.unwrap();
    assert_eq!(response.body.as_ref(), b"/api/events");
    assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn boxed_transport_reports_status() {
    let transport: BoxTransport = Box::new(CountingTransport::default());

    let err = transport.send(&Request::get("/missing")).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.class(), ErrorClass::Client);
}
