//! Request key serialization formats.
//!
//! Stores that address their data by bytes (disk stores, browser storage
//! shims) need a stable encoding of [`RequestKey`].
//!
//! | Format | Size | Reversible | Use Case |
//! |--------|------|------------|----------|
//! | [`Bitcode`](KeyFormat::Bitcode) | Compact | Yes | Default, binary stores |
//! | [`UrlEncoded`](KeyFormat::UrlEncoded) | Larger | Yes | String-keyed stores, debugging |

use std::str::from_utf8;

use netopt_core::RequestKey;

use crate::StoreError;

const METHOD_KEY: &str = "method";
const URL_KEY: &str = "url";
const BODY_KEY: &str = "body";

/// Request key serialization format.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFormat {
    /// Compact binary format using bitcode.
    #[default]
    Bitcode,

    /// URL-encoded query string format, e.g. `method=GET&url=%2Fapi%2Fevents`.
    ///
    /// The `body` pair is present only for requests with a body, so an empty
    /// body and no body stay distinguishable.
    UrlEncoded,
}

impl KeyFormat {
    /// Serialize a request key to bytes.
    pub fn serialize(&self, key: &RequestKey) -> Result<Vec<u8>, StoreError> {
        match self {
            KeyFormat::Bitcode => Ok(bitcode::encode(key)),
            KeyFormat::UrlEncoded => {
                let mut pairs = vec![(METHOD_KEY, key.method()), (URL_KEY, key.url())];
                if let Some(body) = key.body() {
                    pairs.push((BODY_KEY, body));
                }
                serde_urlencoded::to_string(pairs)
                    .map(String::into_bytes)
                    .map_err(|err| StoreError::FormatError(err.to_string()))
            }
        }
    }

    /// Deserialize bytes back to a request key.
    pub fn deserialize(&self, data: &[u8]) -> Result<RequestKey, StoreError> {
        match self {
            KeyFormat::Bitcode => {
                bitcode::decode(data).map_err(|err| StoreError::FormatError(err.to_string()))
            }
            KeyFormat::UrlEncoded => {
                let input =
                    from_utf8(data).map_err(|err| StoreError::FormatError(err.to_string()))?;

                let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input)
                    .map_err(|err| StoreError::FormatError(err.to_string()))?;

                let (mut method, mut url, mut body) = (None, None, None);
                for (name, value) in pairs {
                    match name.as_str() {
                        METHOD_KEY => method = Some(value),
                        URL_KEY => url = Some(value),
                        BODY_KEY => body = Some(value),
                        other => {
                            return Err(StoreError::FormatError(format!(
                                "unexpected key component `{other}`"
                            )));
                        }
                    }
                }

                match (method, url) {
                    (Some(method), Some(url)) => Ok(RequestKey::new(method, url, body)),
                    _ => Err(StoreError::FormatError(
                        "key is missing method or url".to_owned(),
                    )),
                }
            }
        }
    }
}
