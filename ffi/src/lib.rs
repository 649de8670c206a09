//! C-ABI wrapper around `fetch-core`.
//!
//! # Overview
//! Exposes header manipulation, request building and response parsing
//! through `extern "C"` functions so any language with a C FFI can validate
//! HTTP messages without linking to an async runtime or serde directly. The
//! host performs the network exchange itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `fetch_build_request` / `fetch_parse_response` mirror
//!   `Request::to_dispatch` / `Response::from_dispatch`.
//! - A single `FfiResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - Body streams are drained with `futures::executor::block_on`; every
//!   stream built here is in-memory, so nothing ever waits on I/O.
//! - The C caller owns all returned pointers and must call the matching
//!   `fetch_*_free` / `fetch_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use bytes::Bytes;
use fetch_core::{
    BodyInit, BodyMixin, BoxError, DispatchResponse, FetchError, HeadersInit, Request,
    RequestInit, Response,
};
use futures::executor::block_on;
use futures::stream::{self, StreamExt};
use url::Url;

use types::*;

/// Borrow a C string argument as UTF-8. `None` for invalid UTF-8.
///
/// The pointer must be non-null and NUL-terminated.
fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Borrow a caller-owned byte buffer. A zero length yields an empty slice.
fn c_bytes<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
    if len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(ptr, len) }
    }
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Create an empty header collection.
///
/// The caller must free the returned pointer with `fetch_headers_free`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_headers_new() -> *mut FfiHeaders {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiHeaders {
            inner: fetch_core::Headers::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a header collection created by `fetch_headers_new`. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_headers_free(headers: *mut FfiHeaders) {
    if !headers.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(headers) });
        });
    }
}

/// Shared body of `fetch_headers_append` and `fetch_headers_set`.
fn mutate_headers(
    headers: *mut FfiHeaders,
    name: *const c_char,
    value: *const c_char,
    op: fn(&mut fetch_core::Headers, &str, &str) -> Result<(), FetchError>,
) -> FfiErrorCode {
    catch_unwind(|| {
        if headers.is_null() || name.is_null() || value.is_null() {
            return FfiErrorCode::NullArg;
        }
        let (Some(name), Some(value)) = (c_str(name), c_str(value)) else {
            return FfiErrorCode::InvalidUtf8;
        };
        let headers = unsafe { &mut *headers };
        match op(&mut headers.inner, name, value) {
            Ok(()) => FfiErrorCode::Ok,
            Err(e) => FfiErrorCode::from(&e),
        }
    })
    .unwrap_or(FfiErrorCode::Panic)
}

/// Append `value` under `name`, joining onto an existing value with `", "`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_headers_append(
    headers: *mut FfiHeaders,
    name: *const c_char,
    value: *const c_char,
) -> FfiErrorCode {
    mutate_headers(headers, name, value, fetch_core::Headers::append)
}

/// Set `name` to `value`, replacing any existing value.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_headers_set(
    headers: *mut FfiHeaders,
    name: *const c_char,
    value: *const c_char,
) -> FfiErrorCode {
    mutate_headers(headers, name, value, fetch_core::Headers::set)
}

/// Look up the combined value for `name`.
///
/// Returns null if the name is absent or invalid, or an argument is null.
/// The caller must free a non-null result with `fetch_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_headers_get(
    headers: *const FfiHeaders,
    name: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        if headers.is_null() || name.is_null() {
            return std::ptr::null_mut();
        }
        let headers = unsafe { &*headers };
        match c_str(name).map(|name| headers.inner.get(name)) {
            Some(Ok(Some(value))) => to_c_string(value),
            _ => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Tri-state membership test: 1 = present, 0 = absent, -1 = invalid name or
/// null argument.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_headers_has(headers: *const FfiHeaders, name: *const c_char) -> i32 {
    catch_unwind(|| {
        if headers.is_null() || name.is_null() {
            return -1;
        }
        let headers = unsafe { &*headers };
        match c_str(name).map(|name| headers.inner.has(name)) {
            Some(Ok(true)) => 1,
            Some(Ok(false)) => 0,
            _ => -1,
        }
    })
    .unwrap_or(-1)
}

/// Remove `name`. Removing an absent name succeeds.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_headers_delete(
    headers: *mut FfiHeaders,
    name: *const c_char,
) -> FfiErrorCode {
    catch_unwind(|| {
        if headers.is_null() || name.is_null() {
            return FfiErrorCode::NullArg;
        }
        let Some(name) = c_str(name) else {
            return FfiErrorCode::InvalidUtf8;
        };
        let headers = unsafe { &mut *headers };
        match headers.inner.delete(name) {
            Ok(()) => FfiErrorCode::Ok,
            Err(e) => FfiErrorCode::from(&e),
        }
    })
    .unwrap_or(FfiErrorCode::Panic)
}

/// Number of distinct header names. Zero for null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_headers_len(headers: *const FfiHeaders) -> u32 {
    if headers.is_null() {
        return 0;
    }
    catch_unwind(|| unsafe { &*headers }.inner.len() as u32).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Request building
// ---------------------------------------------------------------------------

/// Validate a request and describe it for the caller's transport.
///
/// `method` may be null (defaults to GET). `headers` may be null (no
/// headers); it is copied, not consumed. A null `body` means no body;
/// otherwise `body_len` bytes are copied and sent without a content type.
/// Returns a result with `data_tag = Request` on success.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_build_request(
    url: *const c_char,
    method: *const c_char,
    headers: *const FfiHeaders,
    body: *const u8,
    body_len: usize,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if url.is_null() {
            return FfiResult::null_arg("url");
        }
        let Some(url) = c_str(url) else {
            return FfiResult::invalid_utf8("url");
        };
        let method = if method.is_null() {
            None
        } else {
            match c_str(method) {
                Some(m) => Some(m.to_string()),
                None => return FfiResult::invalid_utf8("method"),
            }
        };
        let headers = if headers.is_null() {
            None
        } else {
            Some(HeadersInit::from(&unsafe { &*headers }.inner))
        };
        let body = if body.is_null() {
            None
        } else {
            Some(BodyInit::from(c_bytes(body, body_len)))
        };

        let init = RequestInit {
            method,
            headers,
            body,
            ..Default::default()
        };
        let request = match Request::new(url, init) {
            Ok(request) => request,
            Err(e) => return FfiResult::from_error(e),
        };
        let mut dispatch = match request.to_dispatch() {
            Ok(dispatch) => dispatch,
            Err(e) => return FfiResult::from_error(e),
        };

        let body = match dispatch.body.take() {
            Some(mut stream) => {
                let drained = block_on(async {
                    let mut out = Vec::new();
                    while let Some(chunk) = stream.next().await {
                        out.extend_from_slice(&chunk.map_err(FetchError::Transport)?);
                    }
                    Ok::<_, FetchError>(out)
                });
                match drained {
                    Ok(bytes) => Some(bytes),
                    Err(e) => return FfiResult::from_error(e),
                }
            }
            None => None,
        };

        FfiResult::ok_request(FfiHttpRequest::from_dispatch(
            request.url().as_str(),
            dispatch,
            body,
        ))
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in fetch_build_request"))
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Validate what the caller's transport received.
///
/// Returns a result with `data_tag = Response` on success. Bodies sent
/// with 101/204/205/304 are dropped.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_parse_response(response: *const FfiHttpResponse) -> *mut FfiResult {
    catch_unwind(|| {
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let resp = unsafe { &*response };
        if resp.url.is_null() {
            return FfiResult::null_arg("response.url");
        }
        let Some(raw_url) = c_str(resp.url) else {
            return FfiResult::invalid_utf8("response.url");
        };
        let url = match Url::parse(raw_url) {
            Ok(url) => url,
            Err(source) => {
                return FfiResult::from_error(FetchError::InvalidUrl {
                    input: raw_url.to_string(),
                    source,
                })
            }
        };

        if resp.headers.is_null() && resp.headers_len > 0 {
            return FfiResult::null_arg("response.headers");
        }
        let mut headers = Vec::with_capacity(resp.headers_len as usize);
        if !resp.headers.is_null() {
            let refs =
                unsafe { std::slice::from_raw_parts(resp.headers, resp.headers_len as usize) };
            for h in refs {
                if h.name.is_null() || h.value.is_null() {
                    return FfiResult::null_arg("response.headers");
                }
                let (Some(name), Some(value)) = (c_str(h.name), c_str(h.value)) else {
                    return FfiResult::invalid_utf8("response.headers");
                };
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let body = if resp.body.is_null() {
            None
        } else {
            let bytes = Bytes::copy_from_slice(c_bytes(resp.body, resp.body_len));
            let stream: fetch_core::ByteStream =
                Box::pin(stream::iter([Ok::<Bytes, BoxError>(bytes)]));
            Some(stream)
        };

        let dispatched = DispatchResponse {
            status_code: resp.status,
            headers: HeadersInit::Pairs(headers),
            body,
        };
        match Response::from_dispatch(dispatched, &url) {
            Ok(response) => FfiResult::ok_response(response),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in fetch_parse_response"))
}

/// Status code of a parsed response. Zero for null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_response_status(response: *const FfiResponse) -> u16 {
    if response.is_null() {
        return 0;
    }
    catch_unwind(AssertUnwindSafe(|| unsafe { &*response }.inner.status())).unwrap_or(0)
}

/// True for a 2xx status. False for null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_response_ok(response: *const FfiResponse) -> bool {
    if response.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| unsafe { &*response }.inner.ok())).unwrap_or(false)
}

/// Look up a response header.
///
/// Returns null if the name is absent or invalid, or an argument is null.
/// The caller must free a non-null result with `fetch_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_response_header(
    response: *const FfiResponse,
    name: *const c_char,
) -> *mut c_char {
    catch_unwind(AssertUnwindSafe(|| {
        if response.is_null() || name.is_null() {
            return std::ptr::null_mut();
        }
        let response = unsafe { &*response };
        match c_str(name).map(|name| response.inner.headers().get(name)) {
            Some(Ok(Some(value))) => to_c_string(value),
            _ => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Read the whole body as UTF-8 text. The body can be read once.
///
/// Returns a result with `data_tag = Text` on success.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_response_text(response: *const FfiResponse) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let response = unsafe { &*response };
        match block_on(response.inner.text()) {
            Ok(text) => FfiResult::ok_text(text),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in fetch_response_text"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiResult` and the payload it owns. Safe to call with null.
/// Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Request => {
                    let req = unsafe { Box::from_raw(result.data as *mut FfiHttpRequest) };
                    unsafe { req.free_fields() };
                }
                FfiDataTag::Response => {
                    drop(unsafe { Box::from_raw(result.data as *mut FfiResponse) });
                }
                FfiDataTag::Text => {
                    drop(unsafe { CString::from_raw(result.data as *mut c_char) });
                }
                FfiDataTag::None => {}
            }
        }
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn fetch_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
