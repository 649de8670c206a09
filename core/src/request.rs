//! Validated request envelope.
//!
//! # Design
//! Construction validates everything up front: URL, method, the
//! GET/HEAD-without-body rule and header names and values. The inferred
//! content type of an extracted body is only added when the caller did not
//! supply a `content-type` header. Redirect mode, integrity, keepalive and
//! the abort signal are stored for the transport and never interpreted.
//!
//! Bodies are never duplicated. Deriving a request from another one, or
//! cloning it, yields a request with a null body unless a new body is given.

use tracing::debug;
use url::Url;

use crate::body::{Body, BodyMixin};
use crate::error::FetchError;
use crate::extract::extract;
use crate::headers::Headers;
use crate::http::{DispatchRequest, Method};
use crate::signal::AbortSignal;
use crate::types::{RedirectMode, RequestInit};

/// What a request can be built from.
#[derive(Debug, Clone, Copy)]
pub enum RequestInput<'a> {
    Str(&'a str),
    Url(&'a Url),
    Request(&'a Request),
}

impl<'a> From<&'a str> for RequestInput<'a> {
    fn from(url: &'a str) -> Self {
        RequestInput::Str(url)
    }
}

impl<'a> From<&'a String> for RequestInput<'a> {
    fn from(url: &'a String) -> Self {
        RequestInput::Str(url)
    }
}

impl<'a> From<&'a Url> for RequestInput<'a> {
    fn from(url: &'a Url) -> Self {
        RequestInput::Url(url)
    }
}

impl<'a> From<&'a Request> for RequestInput<'a> {
    fn from(request: &'a Request) -> Self {
        RequestInput::Request(request)
    }
}

#[derive(Debug)]
pub struct Request {
    url: Url,
    method: Method,
    headers: Headers,
    body: Body,
    redirect: RedirectMode,
    integrity: String,
    keepalive: bool,
    signal: Option<AbortSignal>,
}

impl Request {
    pub fn new<'a>(
        input: impl Into<RequestInput<'a>>,
        init: RequestInit,
    ) -> Result<Self, FetchError> {
        let input = input.into();

        let (url, parent) = match input {
            RequestInput::Request(parent) => (parent.url.clone(), Some(parent)),
            RequestInput::Url(url) => (url.clone(), None),
            RequestInput::Str(raw) => {
                let url = Url::parse(raw).map_err(|source| FetchError::InvalidUrl {
                    input: raw.to_string(),
                    source,
                })?;
                (url, None)
            }
        };

        let method = match &init.method {
            Some(method) => method.parse()?,
            None => parent.map_or(Method::Get, |p| p.method),
        };

        if init.body.is_some() && method.forbids_body() {
            return Err(FetchError::RequestBodyNotAllowed(method));
        }

        let mut headers = match init.headers {
            Some(init) => Headers::try_from_init(init)?,
            None => parent.map(|p| p.headers.clone()).unwrap_or_default(),
        };

        let keepalive = init
            .keepalive
            .unwrap_or_else(|| parent.is_some_and(|p| p.keepalive));

        let body = match init.body {
            Some(input) => {
                let extracted = extract(input, keepalive)?;
                if let Some(content_type) = extracted.content_type {
                    if !headers.has("content-type")? {
                        headers.append("content-type", content_type)?;
                    }
                }
                extracted.body
            }
            None => Body::null(),
        };

        let request = Request {
            url,
            method,
            headers,
            body,
            redirect: init
                .redirect
                .unwrap_or_else(|| parent.map_or_else(RedirectMode::default, |p| p.redirect)),
            integrity: init
                .integrity
                .or_else(|| parent.map(|p| p.integrity.clone()))
                .unwrap_or_default(),
            keepalive,
            signal: init.signal.or_else(|| parent.and_then(|p| p.signal.clone())),
        };
        debug!(
            method = %request.method,
            url = %request.url,
            has_body = !request.body.is_null(),
            "request constructed"
        );
        Ok(request)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn redirect(&self) -> RedirectMode {
        self.redirect
    }

    pub fn integrity(&self) -> &str {
        &self.integrity
    }

    pub fn keepalive(&self) -> bool {
        self.keepalive
    }

    pub fn signal(&self) -> Option<&AbortSignal> {
        self.signal.as_ref()
    }

    /// Copies this request with deep-copied headers and a null body.
    ///
    /// Fails once the body has been disturbed.
    pub fn try_clone(&self) -> Result<Self, FetchError> {
        if self.body.is_disturbed() {
            return Err(FetchError::RequestClone);
        }
        Request::new(self, RequestInit::default())
    }

    /// Path plus query string, as sent on the request line.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{query}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }

    /// Describes this request for the transport.
    ///
    /// Hands the body stream over to the transport, so a non-null body is
    /// disturbed afterwards.
    pub fn to_dispatch(&self) -> Result<DispatchRequest, FetchError> {
        Ok(DispatchRequest {
            origin: self.url.origin().ascii_serialization(),
            path: self.path_and_query(),
            method: self.method,
            headers: self.headers.to_wire(),
            body: self.body.take_stream()?,
            signal: self.signal.clone(),
        })
    }
}

impl BodyMixin for Request {
    fn body(&self) -> &Body {
        &self.body
    }
}
