//! Worker configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigError;
use crate::fallback::Placeholder;

/// External host answered network-first with the cache as fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowedHost {
    /// Host name. Subdomains match too (`tile.openstreetmap.org` covers
    /// `a.tile.openstreetmap.org`).
    pub host: String,
    /// Degraded response served when both the network and the cache fail.
    /// Without one the worker answers `404`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Placeholder>,
}

impl AllowedHost {
    /// Creates an entry without a placeholder.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            placeholder: None,
        }
    }

    /// Sets the placeholder.
    pub fn with_placeholder(self, placeholder: Placeholder) -> Self {
        Self {
            placeholder: Some(placeholder),
            ..self
        }
    }

    /// Returns `true` if `host` is this host or one of its subdomains.
    pub fn matches(&self, host: &str) -> bool {
        host == self.host
            || host
                .strip_suffix(self.host.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

/// Values used when a push payload leaves a field out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationDefaults {
    /// Title shown when the payload has none.
    pub title: String,
    /// Body shown when the payload has none.
    pub body: String,
    /// Icon of every notification.
    pub icon: String,
    /// Badge of every notification.
    pub badge: String,
    /// Page opened on click when the payload has no url.
    pub url: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: "New notification".to_owned(),
            body: String::new(),
            icon: "/icons/icon-192.png".to_owned(),
            badge: "/icons/badge-72.png".to_owned(),
            url: "/".to_owned(),
        }
    }
}

/// Configuration of a [`ServiceWorker`](crate::ServiceWorker).
///
/// ```
/// use netopt_worker::WorkerConfig;
///
/// let config = WorkerConfig::from_yaml(r#"
/// origin: https://app.example.org/
/// version: v42
/// allow_list:
///   - host: fonts.googleapis.com
///     placeholder: empty_css
/// "#).unwrap();
///
/// assert_eq!(config.static_cache_name(), "netopt-static-v42");
/// assert!(config.allowed_host("fonts.googleapis.com").is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Origin the worker is registered for.
    pub origin: Url,
    /// Generation tag. Changing it invalidates every installed cache.
    pub version: String,
    /// Name prefix of the shell cache.
    pub static_prefix: String,
    /// Name prefix of the runtime cache.
    pub dynamic_prefix: String,
    /// Same-origin paths fetched and stored at install time.
    pub precache: Vec<String>,
    /// Path of the application shell served to offline navigations.
    pub shell: String,
    /// Path of the image served when an image cannot be loaded.
    pub fallback_image: String,
    /// External hosts answered network-first.
    ///
    /// The defaults cover fonts, a CDN and map tiles. The platform's own API
    /// host differs per deployment and must be added, e.g. with
    /// [`allow`](Self::allow).
    pub allow_list: Vec<AllowedHost>,
    /// Push notification defaults.
    pub notification: NotificationDefaults,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let origin =
            Url::parse("http://localhost/").expect("Default origin should always parse");
        Self {
            origin,
            version: "v1".to_owned(),
            static_prefix: "netopt-static".to_owned(),
            dynamic_prefix: "netopt-dynamic".to_owned(),
            precache: vec![
                "/".to_owned(),
                "/index.html".to_owned(),
                "/manifest.json".to_owned(),
                "/icons/icon-192.png".to_owned(),
                "/icons/icon-512.png".to_owned(),
                "/images/placeholder.svg".to_owned(),
            ],
            shell: "/index.html".to_owned(),
            fallback_image: "/images/placeholder.svg".to_owned(),
            allow_list: vec![
                AllowedHost::new("fonts.googleapis.com").with_placeholder(Placeholder::EmptyCss),
                AllowedHost::new("fonts.gstatic.com"),
                AllowedHost::new("cdn.jsdelivr.net"),
                AllowedHost::new("tile.openstreetmap.org").with_placeholder(Placeholder::Image),
            ],
            notification: NotificationDefaults::default(),
        }
    }
}

impl WorkerConfig {
    /// Parses a YAML document. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_saphyr::from_str(yaml).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_saphyr::to_string(self).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks what serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "origin must be http or https, got `{}`",
                self.origin.scheme()
            )));
        }
        if self.version.is_empty() {
            return Err(ConfigError::Invalid("version must not be empty".to_owned()));
        }
        if self.static_cache_name() == self.dynamic_cache_name() {
            return Err(ConfigError::Invalid(
                "static and dynamic caches must have different names".to_owned(),
            ));
        }
        Ok(())
    }

    /// Name of the shell cache of this generation.
    pub fn static_cache_name(&self) -> String {
        format!("{}-{}", self.static_prefix, self.version)
    }

    /// Name of the runtime cache of this generation.
    pub fn dynamic_cache_name(&self) -> String {
        format!("{}-{}", self.dynamic_prefix, self.version)
    }

    /// Adds `host` to the allow-list with no placeholder: when it is
    /// unreachable and uncached, requests get a 404.
    pub fn allow(mut self, host: impl Into<String>) -> Self {
        self.allow_list.push(AllowedHost::new(host));
        self
    }

    /// Allow-list entry covering `host`, if any.
    pub fn allowed_host(&self, host: &str) -> Option<&AllowedHost> {
        self.allow_list.iter().find(|allowed| allowed.matches(host))
    }

    /// Resolves a path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.origin.join(path)
    }

    /// Returns `true` if `url` belongs to the worker's origin.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }
}
