//! The `fetch` entry point.
//!
//! # Design
//! `fetch` owns no I/O. It validates the input into a `Request`, hands the
//! resulting `DispatchRequest` to a caller-supplied `Dispatcher`, and wraps
//! whatever comes back with `Response::from_dispatch`. Redirects are not
//! followed and nothing is retried; both are the transport's business.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{DispatchError, FetchError};
use crate::http::{DispatchRequest, DispatchResponse};
use crate::request::{Request, RequestInput};
use crate::response::Response;
use crate::types::RequestInit;

/// Performs one HTTP exchange on behalf of `fetch`.
///
/// Implementations should observe `DispatchRequest::signal` and return
/// `DispatchError::Aborted` once it fires.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResponse, DispatchError>;
}

#[async_trait]
impl<D: Dispatcher + ?Sized> Dispatcher for Box<D> {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResponse, DispatchError> {
        (**self).dispatch(request).await
    }
}

/// Builds a request from `input` and `init` and sends it through
/// `dispatcher`.
pub async fn fetch<'a, D>(
    dispatcher: &D,
    input: impl Into<RequestInput<'a>>,
    init: RequestInit,
) -> Result<Response, FetchError>
where
    D: Dispatcher + ?Sized,
{
    let request = Request::new(input, init)?;
    let outgoing = request.to_dispatch()?;
    debug!(
        method = %outgoing.method,
        origin = %outgoing.origin,
        path = %outgoing.path,
        "dispatching"
    );

    let incoming = match dispatcher.dispatch(outgoing).await {
        Ok(incoming) => incoming,
        Err(DispatchError::Aborted) => {
            debug!(url = %request.url(), "dispatch aborted");
            return Err(FetchError::Abort);
        }
        Err(err) => return Err(err.into()),
    };

    Response::from_dispatch(incoming, request.url())
}
