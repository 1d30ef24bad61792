#![warn(missing_docs)]
//! # netopt-worker
//!
//! Offline and asset cache controller with service-worker semantics.
//!
//! The host runtime (a browser service worker shim, an embedded webview, a
//! desktop shell) forwards its lifecycle and fetch events to a
//! [`ServiceWorker`]. Everything that decides *how* a request is answered is
//! a pure function, [`classify_and_handle`], returning a [`ResponsePlan`];
//! the worker only executes plans against a [`CacheStorage`] and a
//! [`Network`].
//!
//! ## Caches
//!
//! Two version-tagged caches exist at any time, named
//! `{static_prefix}-{version}` and `{dynamic_prefix}-{version}`. The static
//! cache holds the precached application shell; the dynamic cache holds
//! runtime responses. Bumping `version` on deploy is enough to invalidate
//! everything installed by previous versions: activation deletes every cache
//! with another name.
//!
//! ## Fetch handling
//!
//! | Request | Plan |
//! |---------|------|
//! | non-`GET`, non-http(s) | untouched |
//! | allow-listed host | network first, cache then placeholder on failure |
//! | page navigation | network first, cached shell then offline page on failure |
//! | same-origin asset | cache first with background refresh, network on miss |
//! | other cross-origin | untouched |

mod classify;
mod config;
mod error;
mod events;
mod fallback;
mod network;
mod request;
mod storage;
mod worker;

pub use classify::{PassthroughReason, RequestClass, ResponsePlan, classify, classify_and_handle};
pub use config::{AllowedHost, NotificationDefaults, WorkerConfig};
pub use error::{ConfigError, NetworkError, StorageError, WorkerError};
pub use events::{ClientAction, Notification, NotificationData, SyncOutcome, BACKGROUND_SYNC_TAG};
pub use fallback::{Placeholder, offline_page};
pub use network::Network;
pub use request::{Destination, FetchRequest, RequestMode, WorkerResponse};
pub use storage::{CacheStorage, MemoryCacheStorage};
pub use worker::{
    ActivateReport, FetchOutcome, InstallReport, LifecycleState, ResponseSource, ServiceWorker,
};
