//! Pure fetch decisions.
//!
//! [`classify_and_handle`] maps a request to the [`ResponsePlan`] the worker
//! executes. It reads nothing but the request and the configuration, so every
//! routing rule can be tested without storage or network.

use http::Method;

use crate::config::{AllowedHost, WorkerConfig};
use crate::fallback::Placeholder;
use crate::request::FetchRequest;

/// Why a request is left to the host untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughReason {
    /// Not a `GET`.
    Method,
    /// Not `http` or `https`.
    Scheme,
    /// Another origin that is not allow-listed.
    CrossOrigin,
    /// The worker is not activated and controls no page yet.
    Inactive,
}

/// Category of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass<'a> {
    /// Left to the host.
    Passthrough(PassthroughReason),
    /// Targets an allow-listed external host.
    AllowListed(&'a AllowedHost),
    /// Top-level document load.
    Navigation,
    /// Same-origin subresource.
    StaticAsset,
}

/// Categorizes `request`.
///
/// Rules apply in order: non-reads and non-http(s) schemes pass through,
/// allow-listed hosts come next, then navigations, then same-origin assets.
/// Anything left is a foreign request and passes through.
pub fn classify<'a>(request: &FetchRequest, config: &'a WorkerConfig) -> RequestClass<'a> {
    if request.method() != Method::GET {
        return RequestClass::Passthrough(PassthroughReason::Method);
    }
    let url = request.url();
    if !matches!(url.scheme(), "http" | "https") {
        return RequestClass::Passthrough(PassthroughReason::Scheme);
    }
    if let Some(allowed) = url.host_str().and_then(|host| config.allowed_host(host)) {
        return RequestClass::AllowListed(allowed);
    }
    if request.is_navigation() {
        return RequestClass::Navigation;
    }
    if config.is_same_origin(url) {
        return RequestClass::StaticAsset;
    }
    RequestClass::Passthrough(PassthroughReason::CrossOrigin)
}

/// How the worker answers a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePlan {
    /// Do not intercept.
    Passthrough(PassthroughReason),
    /// Network first. Successful responses are stored in `cache`; on network
    /// failure a cached copy, then `placeholder`, then `404` is served.
    NetworkFirst {
        /// Cache receiving live responses.
        cache: String,
        /// Degraded response of the host, if any.
        placeholder: Option<Placeholder>,
    },
    /// Network first. On network failure the cached `shell` from
    /// `shell_cache` is served, then the built-in offline page.
    Navigation {
        /// Cache holding the application shell.
        shell_cache: String,
        /// Cache key of the application shell.
        shell: String,
    },
    /// Cache first with a background refresh. On a miss the network
    /// answers and successful responses are stored in `cache`; on total
    /// failure `placeholder` is served.
    StaleWhileRevalidate {
        /// Caches searched, in order.
        lookup: Vec<String>,
        /// Cache receiving network responses on a miss.
        cache: String,
        /// Degraded response for the resource type.
        placeholder: Placeholder,
        /// Cache key of the fallback image, for image placeholders.
        fallback_image: Option<String>,
    },
}

/// Decides how to answer `request`.
pub fn classify_and_handle(request: &FetchRequest, config: &WorkerConfig) -> ResponsePlan {
    match classify(request, config) {
        RequestClass::Passthrough(reason) => ResponsePlan::Passthrough(reason),
        RequestClass::AllowListed(allowed) => ResponsePlan::NetworkFirst {
            cache: config.dynamic_cache_name(),
            placeholder: allowed.placeholder,
        },
        RequestClass::Navigation => ResponsePlan::Navigation {
            shell_cache: config.static_cache_name(),
            shell: resolved(config, &config.shell),
        },
        RequestClass::StaticAsset => {
            let placeholder = Placeholder::for_destination(request.get_destination());
            let fallback_image = (placeholder == Placeholder::Image)
                .then(|| resolved(config, &config.fallback_image));
            ResponsePlan::StaleWhileRevalidate {
                lookup: vec![config.static_cache_name(), config.dynamic_cache_name()],
                cache: config.dynamic_cache_name(),
                placeholder,
                fallback_image,
            }
        }
    }
}

/// Cache key of a configured same-origin path.
fn resolved(config: &WorkerConfig, path: &str) -> String {
    config
        .resolve(path)
        .map(String::from)
        .unwrap_or_else(|_| path.to_owned())
}
