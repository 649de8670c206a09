//! Single-use message body.
//!
//! # Design
//! A `Body` wraps either nothing (a null body) or a stream of byte chunks.
//! Reading is allowed once: the `disturbed` flag is flipped with an atomic
//! swap before the first chunk is pulled, so a read that fails midway still
//! leaves the body unusable and two racing readers cannot both win. A null
//! body is never disturbed and always reads as empty.
//!
//! `text` decodes UTF-8, `json` parses the decoded text, and `blob` and
//! `form_data` are unsupported and always fail.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream, StreamExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{BoxError, FetchError};

/// A producer of body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

pub struct Body {
    source: Option<Mutex<Option<ByteStream>>>,
    disturbed: AtomicBool,
}

impl Body {
    /// A body with no source.
    pub fn null() -> Self {
        Self {
            source: None,
            disturbed: AtomicBool::new(false),
        }
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self::from_byte_stream(Box::pin(stream))
    }

    pub fn from_byte_stream(stream: ByteStream) -> Self {
        Self {
            source: Some(Mutex::new(Some(stream))),
            disturbed: AtomicBool::new(false),
        }
    }

    /// A body that yields `bytes` as a single chunk.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::from_stream(stream::once(async move { Ok::<_, BoxError>(bytes) }))
    }

    /// A body fed from a synchronous sequence of chunks.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::from_stream(stream::iter(
            chunks.into_iter().map(|chunk| Ok::<Bytes, BoxError>(chunk.into())),
        ))
    }

    pub fn is_null(&self) -> bool {
        self.source.is_none()
    }

    /// True once reading has started.
    pub fn is_disturbed(&self) -> bool {
        self.disturbed.load(Ordering::Acquire)
    }

    /// Marks the body disturbed and hands out its stream.
    ///
    /// Returns `Ok(None)` for a null body, and `BodyUsed` if the body was
    /// already disturbed.
    pub fn take_stream(&self) -> Result<Option<ByteStream>, FetchError> {
        let Some(slot) = &self.source else {
            return Ok(None);
        };
        if self.disturbed.swap(true, Ordering::AcqRel) {
            return Err(FetchError::BodyUsed);
        }
        let stream = slot.lock().take().ok_or(FetchError::BodyUsed)?;
        Ok(Some(stream))
    }

    /// Reads every chunk into one contiguous buffer.
    pub async fn consume(&self) -> Result<Bytes, FetchError> {
        let Some(mut stream) = self.take_stream()? else {
            return Ok(Bytes::new());
        };

        let mut buf = BytesMut::new();
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(FetchError::Transport)?;
            trace!(len = chunk.len(), "body chunk");
            buf.extend_from_slice(&chunk);
            chunks += 1;
        }
        debug!(chunks, len = buf.len(), "body consumed");
        Ok(buf.freeze())
    }

    pub async fn array_buffer(&self) -> Result<Bytes, FetchError> {
        self.consume().await
    }

    pub async fn text(&self) -> Result<String, FetchError> {
        let bytes = self.consume().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    pub async fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        let text = self.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn blob(&self) -> Result<Infallible, FetchError> {
        Err(FetchError::Unsupported("blob"))
    }

    pub async fn form_data(&self) -> Result<Infallible, FetchError> {
        Err(FetchError::Unsupported("formData"))
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::null()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("null", &self.is_null())
            .field("disturbed", &self.is_disturbed())
            .finish()
    }
}

/// Body operations shared by `Request` and `Response`.
pub trait BodyMixin {
    fn body(&self) -> &Body;

    fn body_used(&self) -> bool {
        self.body().is_disturbed()
    }

    fn array_buffer(&self) -> impl Future<Output = Result<Bytes, FetchError>> + Send {
        self.body().array_buffer()
    }

    fn text(&self) -> impl Future<Output = Result<String, FetchError>> + Send {
        self.body().text()
    }

    fn json<T: DeserializeOwned + Send>(
        &self,
    ) -> impl Future<Output = Result<T, FetchError>> + Send {
        self.body().json()
    }

    fn blob(&self) -> impl Future<Output = Result<Infallible, FetchError>> + Send {
        self.body().blob()
    }

    fn form_data(&self) -> impl Future<Output = Result<Infallible, FetchError>> + Send {
        self.body().form_data()
    }
}
