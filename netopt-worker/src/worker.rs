//! Worker lifecycle and plan execution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use http::StatusCode;
use netopt_core::Offload;
use thiserror::Error;
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::classify::{PassthroughReason, ResponsePlan, classify_and_handle};
use crate::config::WorkerConfig;
use crate::events::{self, ClientAction, Notification, SyncOutcome};
use crate::fallback::{Placeholder, offline_page};
use crate::network::Network;
use crate::request::{FetchRequest, WorkerResponse};
use crate::storage::CacheStorage;
use crate::{NetworkError, StorageError, WorkerError};

/// Lifecycle of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, not installed yet.
    Parsed,
    /// Precaching the shell.
    Installing,
    /// Installed, waiting to activate.
    Installed,
    /// Evicting old cache generations.
    Activating,
    /// Controlling pages.
    Activated,
    /// Installation failed; this instance will never activate.
    Redundant,
}

/// Result of [`ServiceWorker::install`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Name of the static cache that was filled.
    pub cache: String,
    /// Manifest entries stored.
    pub cached: Vec<String>,
    /// Manifest entries skipped.
    pub failed: Vec<String>,
}

/// Result of [`ServiceWorker::activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    /// Caches deleted.
    pub deleted: Vec<String>,
    /// Caches left in place.
    pub kept: Vec<String>,
}

/// Where the answer to a fetch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// A live network response.
    Network,
    /// A cached copy.
    Cache,
    /// A degraded placeholder.
    Placeholder,
    /// The built-in offline page.
    OfflinePage,
}

/// How a fetch event was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request itself.
    Passthrough(PassthroughReason),
    /// Answered by the worker.
    Respond {
        /// The response.
        response: WorkerResponse,
        /// Where it came from.
        source: ResponseSource,
    },
}

impl FetchOutcome {
    fn respond(response: WorkerResponse, source: ResponseSource) -> Self {
        FetchOutcome::Respond { response, source }
    }

    /// The response, unless the request passed through.
    pub fn response(&self) -> Option<&WorkerResponse> {
        match self {
            FetchOutcome::Respond { response, .. } => Some(response),
            FetchOutcome::Passthrough(_) => None,
        }
    }

    /// The response source, unless the request passed through.
    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Respond { source, .. } => Some(*source),
            FetchOutcome::Passthrough(_) => None,
        }
    }
}

#[derive(Debug, Error)]
enum PrecacheError {
    #[error("invalid path: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

struct Inner<S, N> {
    config: WorkerConfig,
    storage: S,
    network: N,
    state: Mutex<LifecycleState>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

/// Offline and asset cache controller.
///
/// The host forwards its events: `install` and `activate` once per
/// deployment, `fetch` for every request of a controlled page, and the push,
/// notification click and sync events as they arrive. Cloning is cheap.
///
/// Cache failures never fail a fetch: a failed read is a miss and a failed
/// write is logged and dropped.
pub struct ServiceWorker<S, N, O> {
    inner: Arc<Inner<S, N>>,
    offload: O,
}

impl<S, N, O: Clone> Clone for ServiceWorker<S, N, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            offload: self.offload.clone(),
        }
    }
}

impl<S, N, O> std::fmt::Debug for ServiceWorker<S, N, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("version", &self.inner.config.version)
            .field("state", &self.state())
            .finish()
    }
}

impl<S, N, O> ServiceWorker<S, N, O> {
    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` once install asked to activate without waiting for
    /// older instances to release their pages.
    pub fn skip_waiting_requested(&self) -> bool {
        self.inner.skip_waiting.load(Ordering::Acquire)
    }

    /// Returns `true` once activation took control of every open page.
    pub fn clients_claimed(&self) -> bool {
        self.inner.clients_claimed.load(Ordering::Acquire)
    }

    /// The worker configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    /// Builds the notification for a push message.
    pub fn handle_push(&self, payload: Option<&[u8]>) -> Notification {
        let notification = events::notification_from_push(&self.inner.config.notification, payload);
        debug!(title = %notification.title, url = %notification.data.url, "push received");
        notification
    }

    /// Decides what a click on `notification` opens.
    pub fn handle_notification_click(&self, notification: &Notification) -> ClientAction {
        events::click_action(notification)
    }

    /// Answers a background sync event.
    pub fn handle_sync(&self, tag: &str) -> SyncOutcome {
        let outcome = events::sync_outcome(tag);
        match outcome {
            SyncOutcome::Replayed => info!(tag, "background sync"),
            SyncOutcome::Ignored => debug!(tag, "sync event for another registration"),
        }
        outcome
    }

    fn transition(
        &self,
        action: &'static str,
        from: LifecycleState,
        to: LifecycleState,
    ) -> Result<(), WorkerError> {
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return Err(WorkerError::InvalidState {
                action,
                state: *state,
            });
        }
        debug!(?from, ?to, "lifecycle transition");
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: LifecycleState) {
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(from = ?*state, ?to, "lifecycle transition");
        *state = to;
    }
}

impl<S, N, O> ServiceWorker<S, N, O>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
    O: Offload,
{
    /// Creates a worker in the [`Parsed`](LifecycleState::Parsed) state.
    ///
    /// Background asset refreshes run on `offload`.
    pub fn new(config: WorkerConfig, storage: S, network: N, offload: O) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                storage,
                network,
                state: Mutex::new(LifecycleState::Parsed),
                skip_waiting: AtomicBool::new(false),
                clients_claimed: AtomicBool::new(false),
            }),
            offload,
        }
    }

    /// Precaches the shell manifest into the static cache.
    ///
    /// An entry that cannot be fetched or stored is skipped and reported in
    /// [`InstallReport::failed`]; it never aborts the install. Only a static
    /// cache that cannot be opened does, leaving the worker
    /// [`Redundant`](LifecycleState::Redundant).
    pub async fn install(&self) -> Result<InstallReport, WorkerError> {
        self.transition("install", LifecycleState::Parsed, LifecycleState::Installing)?;

        let cache = self.inner.config.static_cache_name();
        if let Err(error) = self.inner.storage.open(&cache).await {
            warn!(%cache, %error, "cannot open static cache, install failed");
            self.set_state(LifecycleState::Redundant);
            return Err(error.into());
        }

        let mut report = InstallReport {
            cache: cache.clone(),
            cached: Vec::new(),
            failed: Vec::new(),
        };
        for path in &self.inner.config.precache {
            match self.precache(&cache, path).await {
                Ok(()) => report.cached.push(path.clone()),
                Err(error) => {
                    warn!(%path, %error, "asset not precached");
                    report.failed.push(path.clone());
                }
            }
        }

        self.inner.skip_waiting.store(true, Ordering::Release);
        self.set_state(LifecycleState::Installed);
        info!(
            %cache,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "worker installed"
        );
        Ok(report)
    }

    /// Deletes every cache that is not of the current generation, then takes
    /// control of all pages.
    pub async fn activate(&self) -> Result<ActivateReport, WorkerError> {
        self.transition("activate", LifecycleState::Installed, LifecycleState::Activating)?;

        let names = match self.inner.storage.cache_names().await {
            Ok(names) => names,
            Err(error) => {
                warn!(%error, "cannot list caches, activation postponed");
                self.set_state(LifecycleState::Installed);
                return Err(error.into());
            }
        };

        let current = [
            self.inner.config.static_cache_name(),
            self.inner.config.dynamic_cache_name(),
        ];
        let mut report = ActivateReport {
            deleted: Vec::new(),
            kept: Vec::new(),
        };
        for name in names {
            if current.contains(&name) {
                report.kept.push(name);
                continue;
            }
            match self.inner.storage.delete(&name).await {
                Ok(_) => {
                    debug!(cache = %name, "deleted old cache generation");
                    report.deleted.push(name);
                }
                Err(error) => {
                    warn!(cache = %name, %error, "cannot delete old cache generation");
                    report.kept.push(name);
                }
            }
        }

        self.inner.clients_claimed.store(true, Ordering::Release);
        self.set_state(LifecycleState::Activated);
        info!(deleted = report.deleted.len(), "worker activated");
        Ok(report)
    }

    /// Answers an intercepted request.
    ///
    /// Until the worker is activated every request passes through.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchOutcome {
        if self.state() != LifecycleState::Activated {
            return FetchOutcome::Passthrough(PassthroughReason::Inactive);
        }

        let span = debug_span!("worker_fetch", url = %request.url());
        async {
            let plan = classify_and_handle(request, &self.inner.config);
            debug!(?plan, "fetch plan");
            match plan {
                ResponsePlan::Passthrough(reason) => FetchOutcome::Passthrough(reason),
                ResponsePlan::NetworkFirst { cache, placeholder } => {
                    self.network_first(request, &cache, placeholder).await
                }
                ResponsePlan::Navigation { shell_cache, shell } => {
                    self.navigation(request, &shell_cache, &shell).await
                }
                ResponsePlan::StaleWhileRevalidate {
                    lookup,
                    cache,
                    placeholder,
                    fallback_image,
                } => {
                    self.stale_while_revalidate(
                        request,
                        &lookup,
                        cache,
                        placeholder,
                        fallback_image.as_deref(),
                    )
                    .await
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn precache(&self, cache: &str, path: &str) -> Result<(), PrecacheError> {
        let url = self.inner.config.resolve(path)?;
        let request = FetchRequest::new(http::Method::GET, url);
        let response = self.inner.network.fetch(&request).await?;
        if !response.is_success() {
            return Err(PrecacheError::Status(response.status));
        }
        self.inner
            .storage
            .put(cache, &request.cache_key(), response)
            .await?;
        Ok(())
    }

    async fn network_first(
        &self,
        request: &FetchRequest,
        cache: &str,
        placeholder: Option<Placeholder>,
    ) -> FetchOutcome {
        let key = request.cache_key();
        match self.inner.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.inner.store(cache, &key, response.clone()).await;
                }
                FetchOutcome::respond(response, ResponseSource::Network)
            }
            Err(error) => {
                debug!(%error, "network failed, trying cache");
                if let Some((_, cached)) = self.inner.lookup(&[cache], &key).await {
                    return FetchOutcome::respond(cached, ResponseSource::Cache);
                }
                let placeholder = placeholder.unwrap_or(Placeholder::NotFound);
                FetchOutcome::respond(placeholder.response(), ResponseSource::Placeholder)
            }
        }
    }

    async fn navigation(
        &self,
        request: &FetchRequest,
        shell_cache: &str,
        shell: &str,
    ) -> FetchOutcome {
        match self.inner.network.fetch(request).await {
            Ok(response) => FetchOutcome::respond(response, ResponseSource::Network),
            Err(error) => {
                debug!(%error, "navigation failed, serving shell");
                match self.inner.lookup(&[shell_cache], shell).await {
                    Some((_, shell)) => FetchOutcome::respond(shell, ResponseSource::Cache),
                    None => FetchOutcome::respond(offline_page(), ResponseSource::OfflinePage),
                }
            }
        }
    }

    async fn stale_while_revalidate(
        &self,
        request: &FetchRequest,
        lookup: &[String],
        cache: String,
        placeholder: Placeholder,
        fallback_image: Option<&str>,
    ) -> FetchOutcome {
        let key = request.cache_key();
        if let Some((found_in, cached)) = self.inner.lookup(lookup, &key).await {
            self.refresh(request.clone(), found_in, key);
            return FetchOutcome::respond(cached, ResponseSource::Cache);
        }

        match self.inner.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.inner.store(&cache, &key, response.clone()).await;
                }
                FetchOutcome::respond(response, ResponseSource::Network)
            }
            Err(error) => {
                debug!(%error, "asset unavailable, serving placeholder");
                if let Some(image) = fallback_image
                    && let Some((_, image)) = self.inner.lookup(lookup, image).await
                {
                    return FetchOutcome::respond(image, ResponseSource::Placeholder);
                }
                FetchOutcome::respond(placeholder.response(), ResponseSource::Placeholder)
            }
        }
    }

    fn refresh(&self, request: FetchRequest, cache: String, key: String) {
        let inner = Arc::clone(&self.inner);
        self.offload.spawn("asset_refresh", async move {
            match inner.network.fetch(&request).await {
                Ok(response) if response.is_success() => {
                    inner.store(&cache, &key, response).await;
                    debug!(%key, "cached asset refreshed");
                }
                Ok(response) => {
                    debug!(%key, status = %response.status, "refresh not stored");
                }
                Err(error) => debug!(%key, %error, "background refresh failed"),
            }
        });
    }
}

impl<S: CacheStorage, N> Inner<S, N> {
    /// First cached response for `key` among `caches`. Read errors count as
    /// misses.
    async fn lookup<C>(&self, caches: &[C], key: &str) -> Option<(String, WorkerResponse)>
    where
        C: AsRef<str>,
    {
        for cache in caches {
            let cache = cache.as_ref();
            match self.storage.lookup(cache, key).await {
                Ok(Some(response)) => return Some((cache.to_owned(), response)),
                Ok(None) => {}
                Err(error) => warn!(%cache, %key, %error, "cache read failed"),
            }
        }
        None
    }

    async fn store(&self, cache: &str, key: &str, response: WorkerResponse) {
        if let Err(error) = self.storage.put(cache, key, response).await {
            warn!(%cache, %key, %error, "cache write failed");
        }
    }
}
