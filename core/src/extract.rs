//! Body extraction: turns the accepted body inputs into a `Body` plus the
//! content type implied by the input.
//!
//! | input        | body                     | content type                                       |
//! |--------------|--------------------------|----------------------------------------------------|
//! | form params  | URL-encoded UTF-8 bytes  | `application/x-www-form-urlencoded;charset=UTF-8`  |
//! | text         | UTF-8 bytes              | `text/plain;charset=UTF-8`                         |
//! | bytes        | the bytes                | none                                               |
//! | stream       | the stream, unread       | none                                               |

use std::fmt;

use bytes::Bytes;
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use url::form_urlencoded;

use crate::body::{Body, ByteStream};
use crate::error::{BoxError, FetchError};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

/// Ordered name/value pairs serialized as `application/x-www-form-urlencoded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query-style string such as `a=1&b=2`.
    pub fn parse(input: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(input.as_bytes()).into_owned().collect(),
        }
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn serialize(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.pairs)
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for FormParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A value a request or response body can be built from.
#[derive(Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub enum BodyInit {
    Text(String),
    Bytes(Bytes),
    Form(FormParams),
    Stream(ByteStream),
}

impl BodyInit {
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        BodyInit::Stream(Box::pin(stream))
    }

    /// A streaming body fed from a synchronous sequence of chunks.
    pub fn chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
        I::IntoIter: Send + 'static,
    {
        BodyInit::stream(stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok::<Bytes, BoxError>(chunk.into())),
        ))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, BodyInit::Stream(_))
    }
}

impl fmt::Debug for BodyInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyInit::Text(text) => f.debug_tuple("Text").field(text).finish(),
            BodyInit::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            BodyInit::Form(form) => f.debug_tuple("Form").field(form).finish(),
            BodyInit::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for BodyInit {
    fn from(text: String) -> Self {
        BodyInit::Text(text)
    }
}

impl From<&str> for BodyInit {
    fn from(text: &str) -> Self {
        BodyInit::Text(text.to_string())
    }
}

impl From<Bytes> for BodyInit {
    fn from(bytes: Bytes) -> Self {
        BodyInit::Bytes(bytes)
    }
}

impl From<Vec<u8>> for BodyInit {
    fn from(bytes: Vec<u8>) -> Self {
        BodyInit::Bytes(bytes.into())
    }
}

impl From<&[u8]> for BodyInit {
    fn from(bytes: &[u8]) -> Self {
        BodyInit::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<FormParams> for BodyInit {
    fn from(form: FormParams) -> Self {
        BodyInit::Form(form)
    }
}

impl From<ByteStream> for BodyInit {
    fn from(stream: ByteStream) -> Self {
        BodyInit::Stream(stream)
    }
}

/// Classifies a JSON value as a body input.
///
/// Strings are text, arrays of byte-sized integers are bytes, arrays of
/// strings are a chunk sequence and objects of strings are form params.
/// Everything else is rejected.
impl TryFrom<serde_json::Value> for BodyInit {
    type Error = FetchError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::String(text) => Ok(BodyInit::Text(text)),
            Value::Array(items) => {
                if let Some(bytes) = items
                    .iter()
                    .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                    .collect::<Option<Vec<u8>>>()
                {
                    return Ok(BodyInit::Bytes(bytes.into()));
                }
                if let Some(chunks) = items
                    .iter()
                    .map(|v| v.as_str().map(|s| Bytes::from(s.to_string())))
                    .collect::<Option<Vec<Bytes>>>()
                {
                    return Ok(BodyInit::chunks(chunks));
                }
                Err(FetchError::BodyExtraction("array of mixed values".to_string()))
            }
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
                .collect::<Option<FormParams>>()
                .map(BodyInit::Form)
                .ok_or_else(|| {
                    FetchError::BodyExtraction("object with non-string values".to_string())
                }),
            other => Err(FetchError::BodyExtraction(other.to_string())),
        }
    }
}

/// A body ready for transport and the content type implied by its input.
#[derive(Debug)]
pub struct Extracted {
    pub body: Body,
    pub content_type: Option<&'static str>,
}

/// Builds the canonical body for `input`.
///
/// A stream cannot be extracted while `keepalive` is set.
pub fn extract(input: BodyInit, keepalive: bool) -> Result<Extracted, FetchError> {
    let (body, content_type) = match input {
        BodyInit::Form(form) => (Body::from_bytes(form.serialize()), Some(FORM_CONTENT_TYPE)),
        BodyInit::Text(text) => (Body::from_bytes(text), Some(TEXT_CONTENT_TYPE)),
        BodyInit::Bytes(bytes) => (Body::from_bytes(bytes), None),
        BodyInit::Stream(stream) => {
            if keepalive {
                return Err(FetchError::KeepaliveStream);
            }
            (Body::from_byte_stream(stream), None)
        }
    };
    Ok(Extracted { body, content_type })
}
