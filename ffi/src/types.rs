//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer plus length instead of `Vec`,
//! and enums with explicit discriminants. `Headers` and `Response` stay
//! opaque; C only ever holds a pointer to them. Conversion functions live
//! here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use fetch_core::{DispatchRequest, FetchError, Headers, Method, Response};

/// Opaque handle to a `Headers` collection.
pub struct FfiHeaders {
    pub(crate) inner: Headers,
}

/// Opaque handle to a parsed `Response`.
pub struct FfiResponse {
    pub(crate) inner: Response,
}

/// Copy `s` into a C string owned by the caller.
///
/// Interior NUL bytes cannot be represented, so such strings become empty.
pub(crate) fn to_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Head = 1,
    Post = 2,
    Put = 3,
    Delete = 4,
    Connect = 5,
    Options = 6,
    Trace = 7,
    Patch = 8,
}

impl From<Method> for FfiHttpMethod {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => FfiHttpMethod::Get,
            Method::Head => FfiHttpMethod::Head,
            Method::Post => FfiHttpMethod::Post,
            Method::Put => FfiHttpMethod::Put,
            Method::Delete => FfiHttpMethod::Delete,
            Method::Connect => FfiHttpMethod::Connect,
            Method::Options => FfiHttpMethod::Options,
            Method::Trace => FfiHttpMethod::Trace,
            Method::Patch => FfiHttpMethod::Patch,
        }
    }
}

/// A single HTTP header as a name/value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub name: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `fetch_build_request`. The C caller sends it and passes what
/// came back to `fetch_parse_response`. Headers are sorted by lowercase
/// name. `has_body` distinguishes an empty body from no body.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub origin: *mut c_char,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub has_body: bool,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpRequest {
    /// Convert a dispatch description plus its drained body into a
    /// heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_dispatch(
        url: &str,
        req: DispatchRequest,
        body: Option<Vec<u8>>,
    ) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(name, value)| FfiHeader {
                    name: to_c_string(name),
                    value: to_c_string(value),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        let has_body = body.is_some();
        let (body, body_len) = match body {
            Some(bytes) => {
                let len = bytes.len();
                (Box::into_raw(bytes.into_boxed_slice()) as *mut u8, len)
            }
            None => (std::ptr::null_mut(), 0),
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: to_c_string(url),
            origin: to_c_string(req.origin),
            path: to_c_string(req.path),
            headers,
            headers_len,
            has_body,
            body,
            body_len,
        }))
    }

    /// Free everything this request points to (but not the struct itself).
    ///
    /// # Safety
    /// Every pointer must come from `from_dispatch` and not be freed yet.
    pub(crate) unsafe fn free_fields(&self) {
        for s in [self.url, self.origin, self.path] {
            if !s.is_null() {
                drop(unsafe { CString::from_raw(s) });
            }
        }
        if !self.headers.is_null() && self.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    self.headers,
                    self.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.name.is_null() {
                    drop(unsafe { CString::from_raw(h.name) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
        if self.has_body && !self.body.is_null() {
            drop(unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(self.body, self.body_len))
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// A borrowed header pair supplied by the C caller.
#[repr(C)]
pub struct FfiHeaderRef {
    pub name: *const c_char,
    pub value: *const c_char,
}

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this after executing a request, then passes a
/// pointer to `fetch_parse_response`. `url` is the URL the request was sent
/// to. A null `body` means the response had no body. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub url: *const c_char,
    pub status: u16,
    pub headers: *const FfiHeaderRef,
    pub headers_len: u32,
    pub body: *const u8,
    pub body_len: usize,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult` and by header mutators.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidHeader = 1,
    InvalidMethod = 2,
    InvalidUrl = 3,
    BodyNotAllowed = 4,
    InvalidStatus = 5,
    BodyExtraction = 6,
    BodyUsed = 7,
    Clone = 8,
    Decode = 9,
    Unsupported = 10,
    Abort = 11,
    Transport = 12,
    InvalidUtf8 = 13,
    NullArg = 14,
    Panic = 15,
}

impl From<&FetchError> for FfiErrorCode {
    fn from(err: &FetchError) -> Self {
        match err {
            FetchError::InvalidHeaderName(_)
            | FetchError::InvalidHeaderValue { .. }
            | FetchError::InvalidHeaderEntry => FfiErrorCode::InvalidHeader,
            FetchError::InvalidMethod(_) => FfiErrorCode::InvalidMethod,
            FetchError::InvalidUrl { .. } => FfiErrorCode::InvalidUrl,
            FetchError::RequestBodyNotAllowed(_) => FfiErrorCode::BodyNotAllowed,
            FetchError::InvalidStatus(_)
            | FetchError::InvalidRedirectStatus(_)
            | FetchError::NullBodyStatus(_) => FfiErrorCode::InvalidStatus,
            FetchError::BodyExtraction(_) | FetchError::KeepaliveStream => {
                FfiErrorCode::BodyExtraction
            }
            FetchError::BodyUsed => FfiErrorCode::BodyUsed,
            FetchError::RequestClone
            | FetchError::ResponseCloneUsed
            | FetchError::ResponseCloneBody => FfiErrorCode::Clone,
            FetchError::Decode(_) | FetchError::Json(_) => FfiErrorCode::Decode,
            FetchError::Unsupported(_) => FfiErrorCode::Unsupported,
            FetchError::Abort => FfiErrorCode::Abort,
            FetchError::Transport(_) => FfiErrorCode::Transport,
        }
    }
}

/// Tag that tells `fetch_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    Request = 1,
    Response = 2,
    Text = 3,
}

/// Result envelope for every fallible operation.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload (tagged by `data_tag`). The envelope owns the
/// payload; `fetch_free_result` releases both.
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            data_tag,
            data,
        }))
    }

    fn error(error_code: FfiErrorCode, msg: impl Into<Vec<u8>>) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: to_c_string(msg),
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build a success result carrying an `FfiHttpRequest`.
    pub(crate) fn ok_request(req: *mut FfiHttpRequest) -> *mut Self {
        Self::ok(FfiDataTag::Request, req as *mut c_void)
    }

    /// Build a success result carrying an opaque `FfiResponse`.
    pub(crate) fn ok_response(response: Response) -> *mut Self {
        let handle = Box::into_raw(Box::new(FfiResponse { inner: response }));
        Self::ok(FfiDataTag::Response, handle as *mut c_void)
    }

    /// Build a success result carrying a C string.
    ///
    /// Text with an interior NUL cannot cross as a C string and is reported
    /// as a `Decode` error instead.
    pub(crate) fn ok_text(text: String) -> *mut Self {
        match CString::new(text) {
            Ok(text) => Self::ok(FfiDataTag::Text, text.into_raw() as *mut c_void),
            Err(_) => Self::error(FfiErrorCode::Decode, "body contains NUL"),
        }
    }

    /// Build an error result from a `FetchError`.
    pub(crate) fn from_error(err: FetchError) -> *mut Self {
        Self::error(FfiErrorCode::from(&err), err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    /// Build an error result for a string argument that is not UTF-8.
    pub(crate) fn invalid_utf8(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::InvalidUtf8, format!("argument is not UTF-8: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg)
    }
}
