//! Error types for the fetch message model.
//!
//! # Design
//! Validation and usage errors are raised at the call that caused them and
//! never retried. A header lookup miss is not an error (`Ok(None)`), but a
//! malformed header name passed to the lookup is. Errors coming from the
//! transport keep their source so hosts can inspect them; the one
//! normalization performed is mapping an aborted dispatch to `Abort`.

use crate::http::Method;

/// Boxed error produced by transports and body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by header, body, request and response operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Empty header name, or one containing a non-token character.
    #[error("invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// Empty header value, or one containing a forbidden character.
    #[error("invalid value for header {name:?}: {value:?}")]
    InvalidHeaderValue { name: String, value: String },

    /// A headers initializer entry that is not a name/value pair.
    #[error("header entry must be of length two")]
    InvalidHeaderEntry,

    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid URL {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{0} request cannot have a body")]
    RequestBodyNotAllowed(Method),

    #[error("response status must be between 200 and 599 inclusive, found {0}")]
    InvalidStatus(u16),

    #[error("redirect status must be 301, 302, 303, 307, or 308, found {0}")]
    InvalidRedirectStatus(u16),

    /// A body was supplied together with a status that forbids one.
    #[error("response with null body status {0} cannot have a body")]
    NullBodyStatus(u16),

    #[error("cannot extract body from input: {0}")]
    BodyExtraction(String),

    /// Streaming bodies cannot be replayed, so keepalive rejects them.
    #[error("cannot extract a streaming body while keepalive is true")]
    KeepaliveStream,

    #[error("body has already been used")]
    BodyUsed,

    #[error("cannot clone request: body is unusable")]
    RequestClone,

    #[error("cannot clone response: body is unusable")]
    ResponseCloneUsed,

    #[error("cannot clone a non-null body response")]
    ResponseCloneBody,

    /// A body conversion this crate deliberately does not implement.
    #[error("Body.{0}() is not supported")]
    Unsupported(&'static str),

    #[error("body is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The operation was aborted")]
    Abort,

    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
}

/// Errors a `Dispatcher` reports for a failed exchange.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The exchange stopped because the request's abort signal fired.
    #[error("dispatch aborted")]
    Aborted,

    #[error(transparent)]
    Other(BoxError),
}

impl From<DispatchError> for FetchError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Aborted => FetchError::Abort,
            DispatchError::Other(source) => FetchError::Transport(source),
        }
    }
}
