//! WHATWG-style fetch message model: headers, single-use bodies, requests
//! and responses.
//!
//! # Overview
//! Validates and normalizes HTTP messages without touching the network
//! (host-does-IO pattern). `Request::to_dispatch` describes what to send,
//! a caller-supplied `Dispatcher` performs the exchange, and
//! `Response::from_dispatch` wraps the result. `fetch` composes the three.
//!
//! # Design
//! - `Headers` keeps entries sorted by lowercase name with unique names, so
//!   iteration order is deterministic and lookups are binary searches.
//! - A `Body` can be read once. The first read wins even under concurrent
//!   readers; every later read fails with `FetchError::BodyUsed`.
//! - Init dictionaries are plain serde structs so hosts can load them from
//!   JSON.
//! - Diagnostics go through `tracing`; no subscriber is installed here.

pub mod body;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod headers;
pub mod http;
pub mod request;
pub mod response;
pub mod signal;
pub mod types;
pub mod validate;

pub use body::{Body, BodyMixin, ByteStream};
pub use error::{BoxError, DispatchError, FetchError};
pub use extract::{BodyInit, FormParams};
pub use fetch::{fetch, Dispatcher};
pub use headers::{Headers, HeadersInit};
pub use http::{DispatchRequest, DispatchResponse, Method};
pub use request::{Request, RequestInput};
pub use response::Response;
pub use signal::{AbortController, AbortSignal};
pub use types::{RedirectMode, RequestInit, ResponseInit, ResponseType};
