//! Logical request description.
//!
//! A [`Request`] is everything the engine needs to issue an HTTP call and to
//! decide whether two calls are "the same": method, url, body, headers and a
//! scheduling [`Priority`]. Headers take part in the transport call but not in
//! the cache key.
//!
//! ```
//! use netopt_core::{Priority, Request};
//! use serde_json::json;
//!
//! let events = Request::get("/api/events").priority(Priority::High);
//! let signup = Request::post("/api/programs/7/signup", json!({"name": "Ada"}))
//!     .header("authorization", "Bearer token");
//!
//! assert_eq!(events.key().to_string(), "GET /api/events");
//! assert_ne!(events.key(), signup.key());
//! ```

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};

use crate::key::RequestKey;

/// Scheduling tier used by prioritized batches.
///
/// Ordering is `High < Medium < Low` so that a plain stable sort puts the most
/// urgent requests first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Issued before everything else.
    High,
    /// The default tier.
    #[default]
    Medium,
    /// Issued last.
    Low,
}

/// Body of a logical request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON document, sent as `application/json`.
    Json(serde_json::Value),
    /// Pre-encoded bytes (multipart forms, plain text) with their content type.
    Bytes {
        /// Value of the `Content-Type` header.
        content_type: String,
        /// Encoded payload.
        data: Bytes,
    },
}

impl RequestBody {
    /// Returns `true` if there is no body.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Content type implied by the body, if any.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some("application/json"),
            RequestBody::Bytes { content_type, .. } => Some(content_type.as_str()),
        }
    }

    /// Encodes the body into wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Json(value) => Bytes::from(value.to_string()),
            RequestBody::Bytes { data, .. } => data.clone(),
        }
    }
}

/// A logical HTTP request handled by the engine.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: RequestBody,
    priority: Priority,
}

impl Request {
    /// Creates a request with an empty body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            priority: Priority::default(),
        }
    }

    /// Shortcut for a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Shortcut for a `POST` request with a JSON body.
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, url).body(RequestBody::Json(body))
    }

    /// Shortcut for a `PUT` request with a JSON body.
    pub fn put(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::PUT, url).body(RequestBody::Json(body))
    }

    /// Shortcut for a `DELETE` request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Replaces the body.
    pub fn body(self, body: RequestBody) -> Self {
        Self { body, ..self }
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

    /// Sets the scheduling priority.
    pub fn priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    /// Returns the HTTP method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the url, absolute or relative to the transport's base url.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body.
    #[inline]
    pub fn request_body(&self) -> &RequestBody {
        &self.body
    }

    /// Returns the scheduling priority.
    #[inline]
    pub fn get_priority(&self) -> Priority {
        self.priority
    }

    /// Derives the cache key of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::derive(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_sorts_high_first() {
        let mut tiers = vec![Priority::Low, Priority::High, Priority::Medium];
        tiers.sort();
        assert_eq!(tiers, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn invalid_header_is_ignored() {
        let request = Request::get("/api").header("bad header", "x").header("x-ok", "1");
        assert_eq!(request.headers().len(), 1);
    }
}
