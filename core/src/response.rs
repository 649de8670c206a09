//! Validated response envelope.
//!
//! # Design
//! `Response::new` accepts statuses 200 through 599 and rejects a body for
//! null-body statuses. `Response::error` and `Response::redirect` build
//! their instances directly since they fall outside those rules (status 0,
//! or a fixed redirect status with a `location` header). Responses coming
//! from a transport go through `from_dispatch`, which keeps the request URL
//! as the response URL list.

use tracing::debug;
use url::Url;

use crate::body::{Body, BodyMixin};
use crate::error::FetchError;
use crate::extract::{extract, BodyInit};
use crate::headers::Headers;
use crate::http::{is_null_body_status, is_redirect_status, DispatchResponse};
use crate::types::{ResponseInit, ResponseType};

#[derive(Debug)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: Headers,
    body: Body,
    kind: ResponseType,
    url_list: Vec<Url>,
}

impl Response {
    pub fn new(body: Option<BodyInit>, init: ResponseInit) -> Result<Self, FetchError> {
        if !(200..=599).contains(&init.status) {
            return Err(FetchError::InvalidStatus(init.status));
        }
        if body.is_some() && is_null_body_status(init.status) {
            return Err(FetchError::NullBodyStatus(init.status));
        }

        let mut headers = match init.headers {
            Some(init) => Headers::try_from_init(init)?,
            None => Headers::new(),
        };

        let body = match body {
            Some(input) => {
                let extracted = extract(input, false)?;
                if let Some(content_type) = extracted.content_type {
                    if !headers.has("content-type")? {
                        headers.append("content-type", content_type)?;
                    }
                }
                extracted.body
            }
            None => Body::null(),
        };

        Ok(Response {
            status: init.status,
            status_text: init.status_text,
            headers,
            body,
            kind: ResponseType::Default,
            url_list: Vec::new(),
        })
    }

    /// A network error: status 0, type `error`, no headers and no body.
    pub fn error() -> Self {
        Response {
            status: 0,
            status_text: String::new(),
            headers: Headers::new(),
            body: Body::null(),
            kind: ResponseType::Error,
            url_list: Vec::new(),
        }
    }

    /// A null-body redirect to the absolute form of `url`.
    pub fn redirect(url: &str, status: u16) -> Result<Self, FetchError> {
        if !is_redirect_status(status) {
            return Err(FetchError::InvalidRedirectStatus(status));
        }
        let location = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            input: url.to_string(),
            source,
        })?;

        let mut headers = Headers::new();
        headers.set("location", location.as_str())?;

        Ok(Response {
            status,
            status_text: String::new(),
            headers,
            body: Body::null(),
            kind: ResponseType::Default,
            url_list: Vec::new(),
        })
    }

    /// Wraps what a transport returned for a request to `url`.
    ///
    /// A body sent along with a null-body status is dropped.
    pub fn from_dispatch(response: DispatchResponse, url: &Url) -> Result<Self, FetchError> {
        let DispatchResponse {
            status_code,
            headers,
            body,
        } = response;

        let body = body
            .filter(|_| !is_null_body_status(status_code))
            .map(BodyInit::Stream);
        let mut res = Response::new(
            body,
            ResponseInit {
                status: status_code,
                status_text: String::new(),
                headers: Some(headers),
            },
        )?;
        res.url_list.push(url.clone());
        debug!(status = status_code, url = %url, "response received");
        Ok(res)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn redirected(&self) -> bool {
        self.url_list.len() > 1
    }

    /// The last URL in the URL list.
    pub fn url(&self) -> Option<&Url> {
        self.url_list.last()
    }

    pub fn url_list(&self) -> &[Url] {
        &self.url_list
    }

    pub fn response_type(&self) -> ResponseType {
        self.kind
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Copies a null-body response.
    ///
    /// Fails if the body was disturbed, and for any non-null body since
    /// bodies are not duplicated.
    pub fn try_clone(&self) -> Result<Self, FetchError> {
        if self.body.is_disturbed() {
            return Err(FetchError::ResponseCloneUsed);
        }
        if !self.body.is_null() {
            return Err(FetchError::ResponseCloneBody);
        }
        Ok(Response {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: Body::null(),
            kind: self.kind,
            url_list: self.url_list.clone(),
        })
    }
}

impl BodyMixin for Response {
    fn body(&self) -> &Body {
        &self.body
    }
}
