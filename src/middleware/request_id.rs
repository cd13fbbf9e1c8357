use std::fmt;
use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use serde_json::Value;
use tracing::Instrument;

use crate::response::ErrorBody;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlation id for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Reuse a well-formed client id (at most 128 chars of `[A-Za-z0-9_-]`),
    /// otherwise mint a fresh one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|id| is_well_formed(id))
            .map(|id| Self(id.to_string()))
            .unwrap_or_else(|| Self(uuid::Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_well_formed(id: &str) -> bool {
    (1..=128).contains(&id.len())
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Runs the request inside a span tagged with its id, echoes the id back
/// and turns every 4xx/5xx into an `ErrorBody` carrying it as `traceId`.
/// Successful audio passes through without being buffered.
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());

    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    let started = Instant::now();
    let response = next.run(req).instrument(span.clone()).await;
    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );
    });

    let mut response = if response.status().is_client_error() || response.status().is_server_error()
    {
        into_traced_error(response, &id).await
    } else {
        response
    };

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// JSON error objects get `traceId` added. Anything else (empty 405s,
/// plain-text extractor rejections) is replaced by an `ErrorBody`.
async fn into_traced_error(response: Response, id: &RequestId) -> Response {
    let (mut parts, body) = response.into_parts();
    let bytes = body.collect().await.map(|c| c.to_bytes()).unwrap_or_default();

    if let Ok(Value::Object(mut object)) = serde_json::from_slice::<Value>(&bytes) {
        object.insert("traceId".to_string(), Value::String(id.to_string()));
        let patched = serde_json::to_vec(&object).unwrap_or_else(|_| bytes.to_vec());
        parts.headers.remove(header::CONTENT_LENGTH);
        return Response::from_parts(parts, Body::from(patched));
    }

    let status = parts.status;
    let text = String::from_utf8_lossy(&bytes).trim().to_string();
    // Server-side text may describe internals; only client errors echo it.
    let message = if status.is_client_error() && !text.is_empty() {
        text
    } else {
        status.canonical_reason().unwrap_or("Error").to_string()
    };

    (
        status,
        axum::Json(ErrorBody {
            success: false,
            code: fallback_code(status).to_string(),
            message,
            trace_id: Some(id.to_string()),
            details: None,
        }),
    )
        .into_response()
}

/// Codes for errors produced outside `AppError`, mostly by axum itself.
fn fallback_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::TOO_MANY_REQUESTS => "RATE_LIMITED",
        s if s.is_client_error() => "BAD_REQUEST",
        _ => "INTERNAL_ERROR",
    }
}
