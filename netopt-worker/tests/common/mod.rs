#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use netopt::offload::OffloadManager;
use netopt_worker::{
    CacheStorage, FetchRequest, MemoryCacheStorage, Network, NetworkError, ServiceWorker,
    StorageError, WorkerConfig, WorkerResponse,
};

pub const ORIGIN: &str = "https://app.example.org";

/// Network answering scripted urls. Unknown urls fail as if offline.
#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, WorkerResponse>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, response: WorkerResponse) -> Self {
        self.set(url, response);
        self
    }

    pub fn set(&self, url: &str, response: WorkerResponse) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_owned(), response);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| *called == url)
            .count()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<WorkerResponse, NetworkError> {
        let url = request.url().to_string();
        self.calls.lock().unwrap().push(url.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Failed("offline".to_owned()));
        }
        self.routes
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .ok_or(NetworkError::Failed(format!("no route to {url}")))
    }
}

/// Storage whose every operation fails.
#[derive(Clone, Default)]
pub struct BrokenStorage;

#[async_trait]
impl CacheStorage for BrokenStorage {
    async fn open(&self, _name: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_owned()))
    }

    async fn cache_names(&self) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_owned()))
    }

    async fn delete(&self, _name: &str) -> Result<bool, StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_owned()))
    }

    async fn lookup(&self, _name: &str, _key: &str) -> Result<Option<WorkerResponse>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_owned()))
    }

    async fn put(
        &self,
        _name: &str,
        _key: &str,
        _response: WorkerResponse,
    ) -> Result<(), StorageError> {
        Err(StorageError::QuotaExceeded)
    }
}

/// Memory storage whose writes can be made to fail.
#[derive(Clone, Default)]
pub struct FlakyStorage {
    pub inner: MemoryCacheStorage,
    writes_fail: std::sync::Arc<AtomicBool>,
}

impl FlakyStorage {
    pub fn fail_writes(&self) {
        self.writes_fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> Result<(), StorageError> {
        self.inner.open(name).await
    }

    async fn cache_names(&self) -> Result<Vec<String>, StorageError> {
        self.inner.cache_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        self.inner.delete(name).await
    }

    async fn lookup(&self, name: &str, key: &str) -> Result<Option<WorkerResponse>, StorageError> {
        self.inner.lookup(name, key).await
    }

    async fn put(
        &self,
        name: &str,
        key: &str,
        response: WorkerResponse,
    ) -> Result<(), StorageError> {
        if self.writes_fail.load(Ordering::SeqCst) {
            return Err(StorageError::QuotaExceeded);
        }
        self.inner.put(name, key, response).await
    }
}

pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

pub fn config(version: &str) -> WorkerConfig {
    WorkerConfig::from_yaml(&format!(
        r#"
origin: {ORIGIN}/
version: {version}
precache:
  - /index.html
  - /manifest.json
  - /images/placeholder.svg
shell: /index.html
fallback_image: /images/placeholder.svg
allow_list:
  - host: fonts.googleapis.com
    placeholder: empty_css
  - host: api.example.org
"#
    ))
    .unwrap()
}

/// Network serving the precache manifest of [`config`].
pub fn online() -> MockNetwork {
    MockNetwork::new()
        .route(
            &url("/index.html"),
            WorkerResponse::ok("text/html", "<html>shell</html>"),
        )
        .route(
            &url("/manifest.json"),
            WorkerResponse::ok("application/json", "{}"),
        )
        .route(
            &url("/images/placeholder.svg"),
            WorkerResponse::ok("image/svg+xml", "<svg>cached</svg>"),
        )
}

pub type TestWorker<N> = ServiceWorker<MemoryCacheStorage, std::sync::Arc<N>, OffloadManager>;

/// Installs and activates a worker of version `v1`.
pub async fn activated(
    storage: &MemoryCacheStorage,
    network: &std::sync::Arc<MockNetwork>,
) -> (TestWorker<MockNetwork>, OffloadManager) {
    let offload = OffloadManager::with_defaults();
    let worker = ServiceWorker::new(
        config("v1"),
        storage.clone(),
        network.clone(),
        offload.clone(),
    );
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    (worker, offload)
}
