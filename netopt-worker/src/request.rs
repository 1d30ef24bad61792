//! Requests and responses seen by the worker.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use url::Url;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    /// Same-origin subresource.
    #[default]
    SameOrigin,
    /// Cross-origin request with CORS.
    Cors,
    /// Cross-origin request without CORS.
    NoCors,
}

/// What the requested resource will be used as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Destination {
    /// An HTML document.
    Document,
    /// A stylesheet.
    Style,
    /// A script.
    Script,
    /// An image.
    Image,
    /// A font.
    Font,
    /// Anything else (`fetch()` calls, manifests, media).
    #[default]
    Other,
}

impl Destination {
    /// Guesses the destination from the extension of `url`.
    pub fn from_url(url: &Url) -> Self {
        let extension = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, extension)| extension.to_ascii_lowercase());

        match extension.as_deref() {
            Some("html" | "htm") => Destination::Document,
            Some("css") => Destination::Style,
            Some("js" | "mjs") => Destination::Script,
            Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" | "avif") => {
                Destination::Image
            }
            Some("woff" | "woff2" | "ttf" | "otf") => Destination::Font,
            _ => Destination::Other,
        }
    }
}

/// A request intercepted by the worker.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    url: Url,
    mode: RequestMode,
    destination: Destination,
    headers: HeaderMap,
}

impl FetchRequest {
    /// Creates a request. The destination is guessed from the url.
    pub fn new(method: Method, url: Url) -> Self {
        let destination = Destination::from_url(&url);
        Self {
            method,
            url,
            mode: RequestMode::default(),
            destination,
            headers: HeaderMap::new(),
        }
    }

    /// Shortcut for a `GET` request.
    pub fn get(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Method::GET, Url::parse(url)?))
    }

    /// Shortcut for a top-level document load.
    pub fn navigate(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::get(url)?
            .mode(RequestMode::Navigate)
            .destination(Destination::Document))
    }

    /// Sets the mode.
    pub fn mode(self, mode: RequestMode) -> Self {
        Self { mode, ..self }
    }

    /// Sets the destination.
    pub fn destination(self, destination: Destination) -> Self {
        Self {
            destination,
            ..self
        }
    }

    /// Adds a header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Returns the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the url.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the mode.
    pub fn get_mode(&self) -> RequestMode {
        self.mode
    }

    /// Returns the destination.
    pub fn get_destination(&self) -> Destination {
        self.destination
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns `true` for a top-level HTML document load.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Key under which the response is cached: the url without fragment.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.into()
    }
}

/// A complete response, from the network, a cache or synthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerResponse {
    /// Status code.
    pub status: StatusCode,
    /// Headers.
    pub headers: HeaderMap,
    /// Fully buffered body.
    pub body: Bytes,
}

impl WorkerResponse {
    /// Creates a response with empty headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Shortcut for a `200 OK` response with a content type.
    pub fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body).with_content_type(content_type)
    }

    /// Shortcut for an empty `404 Not Found`.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, Bytes::new())
    }

    /// Sets the `Content-Type` header.
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        self
    }

    /// Returns the `Content-Type` header, if any and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Returns `true` for a `2xx` status. Only those are cached.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_follows_extension() {
        let url = |s: &str| Url::parse(s).unwrap();
        assert_eq!(
            Destination::from_url(&url("https://a.org/app.CSS")),
            Destination::Style
        );
        assert_eq!(
            Destination::from_url(&url("https://a.org/js/main.mjs?v=2")),
            Destination::Script
        );
        assert_eq!(
            Destination::from_url(&url("https://a.org/img/logo.svg")),
            Destination::Image
        );
        assert_eq!(
            Destination::from_url(&url("https://a.org/api/events")),
            Destination::Other
        );
    }

    #[test]
    fn cache_key_drops_fragment() {
        let request = FetchRequest::get("https://a.org/docs.html#intro").unwrap();
        assert_eq!(request.cache_key(), "https://a.org/docs.html");
    }
}
