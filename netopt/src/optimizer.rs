//! The request cache, deduplication and retry engine.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::join_all;
use netopt_backend::{MemoryStore, Store};
use netopt_core::{
    CacheEntry, Clock, EntryState, Raw, Request, RequestKey, SharedClock, SystemClock, Transport,
};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, debug_span, info_span, warn};

use crate::inflight::{InFlightTable, Join, SharedFetch};
use crate::metrics::{CacheStats, Counters, Lookup};
use crate::offload::OffloadManager;
use crate::retry::{RetryContext, RetryStates};
use crate::{FetchError, FetchOptions, OptimizerConfig, Persistence, RetryPolicy};

/// Callback invoked with the key of a call that ended in HTTP 401.
pub type AuthFailureHook = Arc<dyn Fn(&RequestKey) + Send + Sync>;

struct Inner<T> {
    transport: T,
    config: OptimizerConfig,
    policy: RetryPolicy,
    memory: MemoryStore,
    session: Option<Arc<dyn Store>>,
    durable: Option<Arc<dyn Store>>,
    clock: SharedClock,
    in_flight: InFlightTable,
    retry_states: RetryStates,
    counters: Counters,
    offload: OffloadManager,
    on_auth_failure: Option<AuthFailureHook>,
}

/// Request cache with in-flight deduplication and retries.
///
/// For every logical request the engine returns, in order of preference:
///
/// 1. a fresh cached value, without touching the network;
/// 2. the outcome of the call already in flight for the same [`RequestKey`];
/// 3. the outcome of a new call, retried with exponential backoff on
///    transient failures and cached on success.
///
/// At most one physical call per key runs at any instant. The call itself
/// runs on a spawned task, so it completes (and populates the cache) even if
/// every caller stops waiting.
///
/// Cloning is cheap; clones share the same caches and tables.
///
/// ```no_run
/// use std::time::Duration;
/// use netopt::NetworkOptimizer;
/// use netopt_core::{BoxTransport, Request};
///
/// # async fn run(transport: BoxTransport) -> Result<(), netopt::FetchError> {
/// let optimizer = NetworkOptimizer::new(transport);
/// let events = optimizer
///     .fetch_optimized(Request::get("/api/events"), Duration::from_secs(300))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct NetworkOptimizer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for NetworkOptimizer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for NetworkOptimizer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkOptimizer")
            .field("config", &self.inner.config)
            .field("memory", &self.inner.memory)
            .field("session", &self.inner.session.as_ref().map(|s| s.label()))
            .field("durable", &self.inner.durable.as_ref().map(|s| s.label()))
            .field("in_flight", &self.inner.in_flight)
            .finish()
    }
}

impl<T> NetworkOptimizer<T>
where
    T: Transport + 'static,
{
    /// Creates an engine with the default configuration and in-memory cache only.
    pub fn new(transport: T) -> Self {
        Self::builder(transport).build()
    }

    /// Starts building an engine around `transport`.
    pub fn builder(transport: T) -> NetworkOptimizerBuilder<T> {
        NetworkOptimizerBuilder::new(transport)
    }

    /// Fetches with the configured default TTL, in-memory only.
    pub async fn fetch(&self, request: Request) -> Result<Raw, FetchError> {
        self.fetch_with(request, FetchOptions::default()).await
    }

    /// Fetches with an explicit TTL.
    pub async fn fetch_optimized(&self, request: Request, ttl: Duration) -> Result<Raw, FetchError> {
        self.fetch_with(request, FetchOptions::default().ttl(ttl))
            .await
    }

    /// Fetches, serving a stale entry immediately when `stale_while_revalidate`
    /// is set and refreshing it in the background.
    ///
    /// A failed background refresh never affects the value already returned.
    pub async fn smart_fetch(
        &self,
        request: Request,
        ttl: Duration,
        stale_while_revalidate: bool,
    ) -> Result<Raw, FetchError> {
        let options = FetchOptions::default()
            .ttl(ttl)
            .stale_while_revalidate(stale_while_revalidate);
        self.fetch_with(request, options).await
    }

    /// Fetches with explicit per-call options.
    pub async fn fetch_with(
        &self,
        request: Request,
        options: FetchOptions,
    ) -> Result<Raw, FetchError> {
        let key = request.key();
        let now = self.inner.clock.now();

        if let Some(entry) = self
            .inner
            .lookup(&key, options.get_persistence(), now)
            .await
        {
            match entry.state_at(now) {
                EntryState::Fresh => {
                    debug!(%key, "cache hit");
                    self.inner.counters.lookup(Lookup::Hit);
                    return Ok(entry.into_value());
                }
                EntryState::Stale if options.is_stale_while_revalidate() => {
                    debug!(%key, "serving stale entry while revalidating");
                    self.inner.counters.lookup(Lookup::Stale);
                    self.revalidate(key, request, options);
                    return Ok(entry.into_value());
                }
                EntryState::Stale => {}
            }
        }

        self.inner.counters.lookup(Lookup::Miss);
        self.join_or_fetch(key, request, options).await
    }

    /// Fetches and decodes a JSON body.
    ///
    /// A body that fails to decode stays cached; only this call fails.
    pub async fn fetch_json<D>(&self, request: Request, options: FetchOptions) -> Result<D, FetchError>
    where
        D: DeserializeOwned,
    {
        let body = self.fetch_with(request, options).await?;
        serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }

    /// Issues every request concurrently.
    ///
    /// Returns one result per request, in input order. A failure never
    /// hides the other outcomes.
    pub async fn batch<I>(&self, requests: I) -> Vec<Result<Raw, FetchError>>
    where
        I: IntoIterator<Item = Request>,
    {
        join_all(requests.into_iter().map(|request| self.fetch(request))).await
    }

    /// Issues requests one at a time, each after the previous one resolved.
    ///
    /// Stops at the first error and returns it; later requests are not issued.
    pub async fn sequential<I>(&self, requests: I) -> Result<Vec<Raw>, FetchError>
    where
        I: IntoIterator<Item = Request>,
    {
        let mut results = Vec::new();
        for request in requests {
            results.push(self.fetch(request).await?);
        }
        Ok(results)
    }

    /// Stable-sorts requests by priority, then issues them as a batch.
    ///
    /// Results come back in the sorted order, each paired with its key.
    pub async fn prioritized<I>(&self, requests: I) -> Vec<(RequestKey, Result<Raw, FetchError>)>
    where
        I: IntoIterator<Item = Request>,
    {
        let mut requests: Vec<Request> = requests.into_iter().collect();
        requests.sort_by_key(Request::get_priority);

        let keys: Vec<RequestKey> = requests.iter().map(Request::key).collect();
        let results = self.batch(requests).await;
        keys.into_iter().zip(results).collect()
    }

    /// Warms the cache with `GET` requests in the background.
    ///
    /// Returns immediately. Failures are logged and never surface.
    pub fn preload<I>(&self, urls: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for url in urls {
            let request = Request::get(url);
            let this = self.clone();
            self.inner.offload.spawn("preload", async move {
                let key = request.key();
                if let Err(error) = this.fetch(request).await {
                    debug!(%key, %error, "preload failed");
                }
            });
        }
    }

    /// Removes the entry of `request` from every store.
    pub async fn invalidate(&self, request: &Request) {
        self.invalidate_key(&request.key()).await;
    }

    /// Removes the entry of `key` from every store.
    pub async fn invalidate_key(&self, key: &RequestKey) {
        for store in self.inner.stores() {
            if let Err(error) = store.remove(key).await {
                warn!(store = %store.label(), %key, %error, "cache remove failed");
            }
        }
    }

    /// Empties every store.
    pub async fn clear_cache(&self) {
        for store in self.inner.stores() {
            if let Err(error) = store.clear().await {
                warn!(store = %store.label(), %error, "cache clear failed");
            }
        }
        debug!("cache cleared");
    }

    /// Drops entries older than `ttl + stale_retention` from every store.
    ///
    /// Returns the number of dropped entries.
    pub async fn sweep_expired(&self) -> usize {
        self.inner.sweep(self.inner.clock.now()).await
    }

    /// Runs [`sweep_expired`](Self::sweep_expired) every `interval` in the
    /// background, until the last clone of this engine is dropped.
    ///
    /// The sweeper is not tracked by the offload manager, so
    /// [`OffloadManager::wait_all`] does not wait for it.
    pub fn spawn_sweeper(&self, interval: Duration) -> Option<JoinHandle<()>> {
        spawn_sweeper(Arc::downgrade(&self.inner), interval)
    }

    /// Snapshot of the engine counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.counters.snapshot()
    }

    /// Number of calls currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Failed attempts recorded for a call that is still retrying.
    pub fn retry_attempts(&self, key: &RequestKey) -> u32 {
        self.inner.retry_states.attempts_made(key)
    }

    /// The manager running background refreshes, preloads and the sweeper.
    pub fn offload(&self) -> &OffloadManager {
        &self.inner.offload
    }

    /// The engine configuration.
    pub fn config(&self) -> &OptimizerConfig {
        &self.inner.config
    }

    fn revalidate(&self, key: RequestKey, request: Request, options: FetchOptions) {
        let this = self.clone();
        self.inner
            .offload
            .spawn_with_key(key.clone(), async move {
                if let Err(error) = this.join_or_fetch(key.clone(), request, options).await {
                    debug!(%key, %error, "background refresh failed");
                }
            });
    }

    async fn join_or_fetch(
        &self,
        key: RequestKey,
        request: Request,
        options: FetchOptions,
    ) -> Result<Raw, FetchError> {
        let join = self
            .inner
            .in_flight
            .join_or_start(&key, || self.start_fetch(key.clone(), request, options));

        if let Join::Follower(_) = join {
            debug!(%key, "joining in-flight request");
            self.inner.counters.deduplicated();
        }

        join.into_future().await
    }

    fn start_fetch(&self, key: RequestKey, request: Request, options: FetchOptions) -> SharedFetch {
        debug!(%key, "cache miss, starting request");
        let inner = Arc::clone(&self.inner);
        let span = debug_span!("fetch", %key);

        let handle = tokio::spawn(
            async move {
                let _registration = InFlightRegistration {
                    table: &inner.in_flight,
                    key: &key,
                };

                match inner.retry_context().call(&key, &request).await {
                    Ok(response) => {
                        inner.store(&key, response.body.clone(), options).await;
                        Ok(response.body)
                    }
                    Err(error) => {
                        if error.is_auth_failure()
                            && let Some(hook) = &inner.on_auth_failure
                        {
                            hook(&key);
                        }
                        Err(error)
                    }
                }
            }
            .instrument(span),
        );

        async move {
            handle
                .await
                .map_err(|err| FetchError::Task(err.to_string()))?
        }
        .boxed()
        .shared()
    }
}

/// Removes the in-flight entry when the call ends, whether it returned or
/// unwound.
struct InFlightRegistration<'a> {
    table: &'a InFlightTable,
    key: &'a RequestKey,
}

impl Drop for InFlightRegistration<'_> {
    fn drop(&mut self) {
        self.table.remove(self.key);
    }
}

impl<T: Transport> Inner<T> {
    fn retry_context(&self) -> RetryContext<'_, T> {
        RetryContext {
            transport: &self.transport,
            policy: self.policy,
            timeout: self.config.request_timeout,
            states: &self.retry_states,
            counters: &self.counters,
        }
    }

    fn persisted(&self, persistence: Persistence) -> Option<&dyn Store> {
        let store = match persistence {
            Persistence::Memory => return None,
            Persistence::Session => self.session.as_deref(),
            Persistence::Durable => self.durable.as_deref(),
        };
        if store.is_none() {
            debug!(?persistence, "no store configured for persistence, using memory only");
        }
        store
    }

    fn stores(&self) -> impl Iterator<Item = &dyn Store> {
        std::iter::once(&self.memory as &dyn Store)
            .chain(self.session.as_deref())
            .chain(self.durable.as_deref())
    }

    /// Finds the best entry for `key`: a fresh one if any store has it,
    /// otherwise whichever stale one is still retained.
    async fn lookup(
        &self,
        key: &RequestKey,
        persistence: Persistence,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry<Raw>> {
        let in_memory = read_or_miss(&self.memory, key).await;
        if in_memory.as_ref().is_some_and(|entry| entry.is_valid_at(now)) {
            return in_memory;
        }

        let store = self.persisted(persistence)?;
        match read_or_miss(store, key).await {
            Some(entry) if entry.is_valid_at(now) => {
                debug!(%key, store = %store.label(), "hydrating memory from persisted store");
                if let Err(error) = self.memory.write(key, entry.clone()).await {
                    warn!(%key, %error, "cache write failed");
                }
                Some(entry)
            }
            persisted => in_memory.or(persisted),
        }
    }

    async fn store(&self, key: &RequestKey, body: Raw, options: FetchOptions) {
        let ttl = options.get_ttl().unwrap_or(self.config.default_ttl);
        let entry = CacheEntry::new(body, self.clock.now(), ttl);

        if let Some(store) = self.persisted(options.get_persistence())
            && let Err(error) = store.write(key, entry.clone()).await
        {
            warn!(store = %store.label(), %key, %error, "cache write failed");
        }
        if let Err(error) = self.memory.write(key, entry).await {
            warn!(store = %self.memory.label(), %key, %error, "cache write failed");
        }
    }

    async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut dropped = 0;
        for store in self.stores() {
            match store.sweep(now, self.config.stale_retention).await {
                Ok(count) => dropped += count,
                Err(error) => warn!(store = %store.label(), %error, "cache sweep failed"),
            }
        }
        dropped
    }
}

async fn read_or_miss(store: &dyn Store, key: &RequestKey) -> Option<CacheEntry<Raw>> {
    match store.read(key).await {
        Ok(entry) => entry,
        Err(error) => {
            warn!(store = %store.label(), %key, %error, "cache read failed, treating as miss");
            None
        }
    }
}

fn spawn_sweeper<T>(inner: Weak<Inner<T>>, interval: Duration) -> Option<JoinHandle<()>>
where
    T: Transport + 'static,
{
    if interval.is_zero() {
        warn!("sweep interval must be positive, sweeper not started");
        return None;
    }
    let span = info_span!("sweeper", interval = ?interval);
    let sweeper = async move {
        loop {
            tokio::time::sleep(interval).await;
            let Some(inner) = inner.upgrade() else {
                debug!("engine dropped, stopping sweeper");
                break;
            };
            let dropped = inner.sweep(inner.clock.now()).await;
            if dropped > 0 {
                debug!(dropped, "swept expired entries");
            }
        }
    };
    Some(tokio::spawn(sweeper.instrument(span)))
}

/// Builder for [`NetworkOptimizer`].
///
/// ```no_run
/// use netopt::{NetworkOptimizer, OptimizerConfig};
/// use netopt_backend::MemoryStore;
/// use netopt_core::BoxTransport;
///
/// # fn build(transport: BoxTransport) {
/// let optimizer = NetworkOptimizer::builder(transport)
///     .config(OptimizerConfig::default())
///     .session_store(MemoryStore::new().with_label("session"))
///     .on_auth_failure(|key| tracing::warn!(%key, "session expired"))
///     .build();
/// # }
/// ```
pub struct NetworkOptimizerBuilder<T> {
    transport: T,
    config: OptimizerConfig,
    session: Option<Arc<dyn Store>>,
    durable: Option<Arc<dyn Store>>,
    clock: SharedClock,
    offload: Option<OffloadManager>,
    on_auth_failure: Option<AuthFailureHook>,
}

impl<T> NetworkOptimizerBuilder<T>
where
    T: Transport + 'static,
{
    fn new(transport: T) -> Self {
        Self {
            transport,
            config: OptimizerConfig::default(),
            session: None,
            durable: None,
            clock: Arc::new(SystemClock),
            offload: None,
            on_auth_failure: None,
        }
    }

    /// Sets the configuration.
    pub fn config(self, config: OptimizerConfig) -> Self {
        Self { config, ..self }
    }

    /// Sets the store used by [`Persistence::Session`].
    pub fn session_store(self, store: impl Store + 'static) -> Self {
        Self {
            session: Some(Arc::new(store)),
            ..self
        }
    }

    /// Sets the store used by [`Persistence::Durable`].
    pub fn durable_store(self, store: impl Store + 'static) -> Self {
        Self {
            durable: Some(Arc::new(store)),
            ..self
        }
    }

    /// Sets the clock that decides entry freshness.
    pub fn clock(self, clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
            ..self
        }
    }

    /// Sets the manager running background work.
    pub fn offload(self, offload: OffloadManager) -> Self {
        Self {
            offload: Some(offload),
            ..self
        }
    }

    /// Registers a callback for calls that end in HTTP 401.
    pub fn on_auth_failure<F>(self, hook: F) -> Self
    where
        F: Fn(&RequestKey) + Send + Sync + 'static,
    {
        Self {
            on_auth_failure: Some(Arc::new(hook)),
            ..self
        }
    }

    /// Builds the engine.
    ///
    /// When `sweep_interval` is configured and a tokio runtime is running,
    /// the sweeper starts right away.
    pub fn build(self) -> NetworkOptimizer<T> {
        let policy = RetryPolicy::from(self.config.retry);
        let inner = Arc::new(Inner {
            transport: self.transport,
            policy,
            memory: MemoryStore::new(),
            session: self.session,
            durable: self.durable,
            clock: self.clock,
            in_flight: InFlightTable::default(),
            retry_states: RetryStates::default(),
            counters: Counters::default(),
            offload: self.offload.unwrap_or_default(),
            on_auth_failure: self.on_auth_failure,
            config: self.config,
        });

        if let Some(interval) = inner.config.sweep_interval {
            if tokio::runtime::Handle::try_current().is_ok() {
                spawn_sweeper(Arc::downgrade(&inner), interval);
            } else {
                warn!("no tokio runtime, sweeper not started");
            }
        }

        NetworkOptimizer { inner }
    }
}
