//! Request key derivation.
//!
//! A [`RequestKey`] identifies a logical request by `(method, url, serialized body)`.
//! Headers never take part in the key.
//!
//! ## Determinism
//!
//! Two logically identical requests must map to the same key, so JSON bodies
//! are serialized canonically: object members are emitted in sorted key order
//! regardless of how the document was built. Opaque byte bodies are keyed by
//! content type plus a SHA-256 digest of the payload.
//!
//! ```
//! use netopt_core::{Request, RequestKey, derive_key};
//! use serde_json::json;
//!
//! let a = Request::post("/api/donations", json!({"amount": 10, "currency": "EUR"}));
//! let b = Request::post("/api/donations", json!({"currency": "EUR", "amount": 10}));
//! assert_eq!(derive_key(&a), RequestKey::derive(&b));
//!
//! let key = Request::get("/api/events").key();
//! assert_eq!(format!("{}", key), "GET /api/events");
//! ```
//!
//! ## Collisions
//!
//! The key keeps method, url and body as separate fields rather than
//! concatenating them, so no choice of url or body text can make two
//! different requests compare equal.

use std::fmt;
use std::mem::size_of;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::request::{Request, RequestBody};

/// A cache key identifying a logical request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct RequestKey {
    method: String,
    url: String,
    body: Option<String>,
}

impl RequestKey {
    /// Creates a key from its parts.
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        body: Option<impl Into<String>>,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            body: body.map(Into::into),
        }
    }

    /// Derives the key of a request.
    pub fn derive(request: &Request) -> Self {
        Self {
            method: request.method().as_str().to_owned(),
            url: request.url().to_owned(),
            body: serialize_body(request.request_body()),
        }
    }

    /// Returns the method part of the key.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the url part of the key.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the serialized body part of the key.
    #[inline]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the estimated memory footprint of this key in bytes.
    pub fn memory_size(&self) -> usize {
        size_of::<Self>()
            + self.method.len()
            + self.url.len()
            + self.body.as_ref().map_or(0, String::len)
    }
}

/// Derives the key of `request`. Same as [`RequestKey::derive`].
#[inline]
pub fn derive_key(request: &Request) -> RequestKey {
    RequestKey::derive(request)
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)?;
        if let Some(body) = &self.body {
            write!(f, " {}", body)?;
        }
        Ok(())
    }
}

fn serialize_body(body: &RequestBody) -> Option<String> {
    match body {
        RequestBody::Empty => None,
        RequestBody::Json(value) => {
            let mut out = String::new();
            write_canonical(value, &mut out);
            Some(out)
        }
        RequestBody::Bytes { content_type, data } => {
            let digest = Sha256::digest(data);
            Some(format!("{};sha256={}", content_type, hex::encode(digest)))
        }
    }
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (i, (name, member)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(member, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
