//! Full fetch lifecycle against an in-memory transport.
//!
//! # Design
//! `MemoryStore` implements `Dispatcher` as a tiny key/value service keyed
//! by request path: `PUT` stores the body, `GET` returns it, `DELETE`
//! removes it. Every exchange goes through `fetch`, so request validation,
//! dispatch and response wrapping are exercised together.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use parking_lot::Mutex;

use fetch_core::{
    fetch, AbortController, BodyInit, BodyMixin, BoxError, ByteStream, DispatchError,
    DispatchRequest, DispatchResponse, Dispatcher, FetchError, HeadersInit, Method, Request,
    RequestInit,
};

#[derive(Default)]
struct MemoryStore {
    items: Mutex<HashMap<String, (String, Bytes)>>,
}

fn reply(status: u16, headers: Vec<(String, String)>, body: Option<Bytes>) -> DispatchResponse {
    DispatchResponse {
        status_code: status,
        headers: HeadersInit::Pairs(headers),
        body: body.map(|b| Box::pin(stream::iter([Ok::<Bytes, BoxError>(b)])) as ByteStream),
    }
}

#[async_trait]
impl Dispatcher for MemoryStore {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResponse, DispatchError> {
        let mut body = Vec::new();
        if let Some(mut stream) = request.body {
            while let Some(chunk) = stream.next().await {
                body.extend_from_slice(&chunk.map_err(DispatchError::Other)?);
            }
        }

        let response = match request.method {
            Method::Put => {
                let content_type = request
                    .headers
                    .iter()
                    .find(|(name, _)| name == "content-type")
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let created = self
                    .items
                    .lock()
                    .insert(request.path, (content_type, body.into()))
                    .is_none();
                reply(if created { 201 } else { 204 }, Vec::new(), None)
            }
            Method::Get | Method::Head => match self.items.lock().get(&request.path) {
                Some((content_type, stored)) => reply(
                    200,
                    vec![
                        ("Content-Type".to_string(), content_type.clone()),
                        ("Content-Length".to_string(), stored.len().to_string()),
                    ],
                    (request.method == Method::Get).then(|| stored.clone()),
                ),
                None => reply(404, Vec::new(), Some(Bytes::from_static(b"not found"))),
            },
            Method::Delete => match self.items.lock().remove(&request.path) {
                Some(_) => reply(204, Vec::new(), None),
                None => reply(404, Vec::new(), None),
            },
            _ => reply(
                405,
                vec![("Allow".to_string(), "GET, HEAD, PUT, DELETE".to_string())],
                None,
            ),
        };
        Ok(response)
    }
}

fn with_method(method: &str) -> RequestInit {
    RequestInit {
        method: Some(method.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn store_lifecycle() {
    let store = MemoryStore::default();
    let url = "http://store.local/items/1";

    // Step 1: nothing stored yet.
    let res = fetch(&store, url, RequestInit::default()).await.unwrap();
    assert_eq!(res.status(), 404);
    assert!(!res.ok());
    assert_eq!(res.text().await.unwrap(), "not found");

    // Step 2: store a text body.
    let init = RequestInit {
        method: Some("PUT".to_string()),
        body: Some("undici-fetch".into()),
        ..Default::default()
    };
    let res = fetch(&store, url, init).await.unwrap();
    assert_eq!(res.status(), 201);
    assert!(res.body().is_null());

    // Step 3: read it back with the inferred content type.
    let res = fetch(&store, url, RequestInit::default()).await.unwrap();
    assert!(res.ok());
    assert_eq!(res.url().map(|u| u.as_str()), Some(url));
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        Some("text/plain;charset=UTF-8")
    );
    assert_eq!(res.headers().get("content-length").unwrap(), Some("12"));
    assert_eq!(res.text().await.unwrap(), "undici-fetch");
    assert!(res.body_used());
    assert!(matches!(res.text().await, Err(FetchError::BodyUsed)));

    // Step 4: overwrite with JSON and a caller-supplied content type.
    let init = RequestInit {
        method: Some("put".to_string()),
        headers: Some([("Content-Type", "application/json")].into()),
        body: Some(r#"{"title":"fetch","done":false}"#.into()),
        ..Default::default()
    };
    let res = fetch(&store, url, init).await.unwrap();
    assert_eq!(res.status(), 204);

    let res = fetch(&store, url, RequestInit::default()).await.unwrap();
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        Some("application/json")
    );
    let value: serde_json::Value = res.json().await.unwrap();
    assert_eq!(value, serde_json::json!({ "title": "fetch", "done": false }));

    // Step 5: HEAD carries headers but no body.
    let res = fetch(&store, url, with_method("HEAD")).await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.body().is_null());
    assert_eq!(res.text().await.unwrap(), "");

    // Step 6: delete, then confirm it is gone.
    let res = fetch(&store, url, with_method("DELETE")).await.unwrap();
    assert_eq!(res.status(), 204);
    let res = fetch(&store, url, with_method("DELETE")).await.unwrap();
    assert_eq!(res.status(), 404);
    let res = fetch(&store, url, RequestInit::default()).await.unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn streamed_upload_and_unsupported_method() {
    let store = MemoryStore::default();
    let url = "http://store.local/items/stream";

    let init = RequestInit {
        method: Some("PUT".to_string()),
        body: Some(BodyInit::chunks(["undici", "-", "fetch"])),
        ..Default::default()
    };
    assert_eq!(fetch(&store, url, init).await.unwrap().status(), 201);

    let res = fetch(&store, url, RequestInit::default()).await.unwrap();
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        Some("application/octet-stream")
    );
    assert_eq!(&res.array_buffer().await.unwrap()[..], b"undici-fetch");

    let res = fetch(&store, url, with_method("PATCH")).await.unwrap();
    assert_eq!(res.status(), 405);
    assert_eq!(
        res.headers().get("allow").unwrap(),
        Some("GET, HEAD, PUT, DELETE")
    );
}

#[tokio::test]
async fn derived_request_reuses_method_and_headers() {
    let store = MemoryStore::default();
    let base = Request::new(
        "http://store.local/items/derived",
        RequestInit {
            method: Some("PUT".to_string()),
            headers: Some([("content-type", "text/csv")].into()),
            ..Default::default()
        },
    )
    .unwrap();

    let init = RequestInit {
        body: Some("a,b\n1,2".into()),
        ..Default::default()
    };
    let res = fetch(&store, &base, init).await.unwrap();
    assert_eq!(res.status(), 201);

    let res = fetch(&store, "http://store.local/items/derived", RequestInit::default())
        .await
        .unwrap();
    assert_eq!(res.headers().get("content-type").unwrap(), Some("text/csv"));
    assert_eq!(res.text().await.unwrap(), "a,b\n1,2");
}

/// Never answers until the abort signal fires.
struct Slow;

#[async_trait]
impl Dispatcher for Slow {
    async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResponse, DispatchError> {
        let signal = request
            .signal
            .ok_or_else(|| DispatchError::Other("no signal".into()))?;
        signal.cancelled().await;
        Err(DispatchError::Aborted)
    }
}

#[tokio::test]
async fn abort_during_dispatch() {
    let controller = AbortController::new();
    let init = RequestInit {
        signal: Some(controller.signal()),
        ..Default::default()
    };

    let pending = tokio::spawn(async move { fetch(&Slow, "http://store.local/slow", init).await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    controller.abort();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, FetchError::Abort));
    assert_eq!(err.to_string(), "The operation was aborted");
}

#[tokio::test]
async fn failing_upload_stream_is_a_transport_error() {
    let store = MemoryStore::default();
    let chunks: Vec<Result<Bytes, BoxError>> = vec![
        Ok(Bytes::from_static(b"partial")),
        Err("upload interrupted".into()),
    ];
    let init = RequestInit {
        method: Some("PUT".to_string()),
        body: Some(BodyInit::stream(stream::iter(chunks))),
        ..Default::default()
    };

    let err = fetch(&store, "http://store.local/items/broken", init)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    assert!(store.items.lock().is_empty());
}
