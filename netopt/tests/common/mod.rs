#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use netopt::{Request, Transport, TransportError, TransportResponse};
use netopt_backend::{DeleteStatus, Store, StoreError, StoreResult};
use netopt_core::{CacheEntry, Raw, RequestKey, StoreLabel};
use tokio::time::Instant;

pub type Reply = Result<TransportResponse, TransportError>;

/// Transport replaying scripted replies per url.
///
/// Each url has a queue of replies; the last one repeats forever. Unknown
/// urls answer 404.
#[derive(Default)]
pub struct MockTransport {
    delay: Duration,
    script: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    pub fn reply(self, url: &str, reply: Reply) -> Self {
        self.push(url, reply);
        self
    }

    /// Appends a reply to the queue of `url`.
    pub fn push(&self, url: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .entry(url.to_owned())
            .or_default()
            .push_back(reply);
    }

    /// Drops the scripted replies of `url` and answers `reply` from now on.
    pub fn set(&self, url: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_owned(), VecDeque::from([reply]));
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Instants at which `url` was called.
    pub fn call_times(&self, url: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(called, _)| called == url)
            .map(|(_, at)| *at)
            .collect()
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut script = self.script.lock().unwrap();
        match script.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Ok(TransportResponse::new(StatusCode::NOT_FOUND, "not found")),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &Request) -> Result<TransportResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.url().to_owned(), Instant::now()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.next_reply(request.url())
    }
}

pub fn ok(body: &'static str) -> Reply {
    Ok(TransportResponse::ok(body))
}

pub fn status(code: u16) -> Reply {
    let status = StatusCode::from_u16(code).unwrap();
    Ok(TransportResponse::new(status, "error"))
}

pub fn network_failure() -> Reply {
    Err(TransportError::NetworkFailure("connection refused".to_owned()))
}

/// Store whose every operation fails, like storage that is full or disabled.
///
/// Clones share the attempt counter.
#[derive(Clone, Debug, Default)]
pub struct FailingStore {
    attempts: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations attempted so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn fail<T>(&self) -> StoreResult<T> {
        self.attempts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Err(StoreError::connection(std::io::Error::other("quota exceeded")))
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn read(&self, _key: &RequestKey) -> StoreResult<Option<CacheEntry<Raw>>> {
        self.fail()
    }

    async fn write(&self, _key: &RequestKey, _entry: CacheEntry<Raw>) -> StoreResult<()> {
        self.fail()
    }

    async fn remove(&self, _key: &RequestKey) -> StoreResult<DeleteStatus> {
        self.fail()
    }

    async fn clear(&self) -> StoreResult<()> {
        self.fail()
    }

    fn label(&self) -> StoreLabel {
        StoreLabel::new_static("failing")
    }
}
