//! One-shot requests against an in-process router.

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

/// A response with its body decoded as JSON (`Value::Null` for an empty body).
pub struct JsonResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: Value,
}

/// Send `GET uri` through `router` and decode the JSON body.
///
/// Panics if the router fails or the body is not JSON.
pub async fn get_json(router: &Router, uri: &str) -> JsonResponse {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|e| panic!("non-JSON body from {uri}: {e}"))
    };
    JsonResponse {
        status,
        headers,
        body,
    }
}
