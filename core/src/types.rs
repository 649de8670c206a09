//! Init dictionaries for `Request` and `Response`.
//!
//! # Design
//! Every field is optional and deserializable, so a host can load an init
//! from JSON as well as build it in code with `..Default::default()`. The
//! abort signal is a live handle and is never deserialized.

use serde::{Deserialize, Serialize};

use crate::extract::BodyInit;
use crate::headers::HeadersInit;
use crate::signal::AbortSignal;

/// How the transport should treat redirects. Carried through, not acted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    #[default]
    Follow,
    Error,
    Manual,
}

impl RedirectMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectMode::Follow => "follow",
            RedirectMode::Error => "error",
            RedirectMode::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Default,
    Error,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Default => "default",
            ResponseType::Error => "error",
        }
    }
}

/// Options for `Request::new`. Unset fields fall back to the input request
/// when deriving from one, otherwise to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: Option<HeadersInit>,
    pub body: Option<BodyInit>,
    pub redirect: Option<RedirectMode>,
    pub integrity: Option<String>,
    pub keepalive: Option<bool>,
    #[serde(skip)]
    pub signal: Option<AbortSignal>,
}

/// Options for `Response::new`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseInit {
    pub status: u16,
    pub status_text: String,
    pub headers: Option<HeadersInit>,
}

impl Default for ResponseInit {
    fn default() -> Self {
        Self {
            status: 200,
            status_text: String::new(),
            headers: None,
        }
    }
}
