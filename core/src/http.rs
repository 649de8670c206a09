//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! The core never touches a socket. `Request::to_dispatch` produces a
//! `DispatchRequest` describing what to send; the transport performs the
//! exchange and hands back a `DispatchResponse`, which
//! `Response::from_dispatch` validates and wraps. Header lists use owned
//! `(String, String)` pairs so values can cross FFI boundaries without
//! lifetime concerns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::body::ByteStream;
use crate::error::FetchError;
use crate::headers::HeadersInit;
use crate::signal::AbortSignal;

/// HTTP method of a request, limited to the canonical method set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
        }
    }

    /// `GET` and `HEAD` requests must not carry a body.
    pub fn forbids_body(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

impl FromStr for Method {
    type Err = FetchError;

    /// Parses a method name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "CONNECT" => Method::Connect,
            "OPTIONS" => Method::Options,
            "TRACE" => Method::Trace,
            "PATCH" => Method::Patch,
            _ => return Err(FetchError::InvalidMethod(s.to_string())),
        };
        Ok(method)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses for which a response body is semantically forbidden.
pub const NULL_BODY_STATUSES: [u16; 4] = [101, 204, 205, 304];

pub fn is_null_body_status(status: u16) -> bool {
    NULL_BODY_STATUSES.contains(&status)
}

/// Redirect statuses accepted by `Response::redirect`.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

pub fn is_redirect_status(status: u16) -> bool {
    REDIRECT_STATUSES.contains(&status)
}

/// What the transport is asked to send.
///
/// Built by `Request::to_dispatch`. `path` is the URL path followed by its
/// query string, if any.
pub struct DispatchRequest {
    pub origin: String,
    pub path: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<ByteStream>,
    pub signal: Option<AbortSignal>,
}

impl fmt::Debug for DispatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRequest")
            .field("origin", &self.origin)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .field("signal", &self.signal)
            .finish()
    }
}

/// What the transport hands back after the exchange.
///
/// Same-named incoming headers are expected to be joined already; `Headers`
/// only combines values on `append`.
pub struct DispatchResponse {
    pub status_code: u16,
    pub headers: HeadersInit,
    pub body: Option<ByteStream>,
}

impl fmt::Debug for DispatchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchResponse")
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}
