use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Captured {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    content_type: &'static str,
    body: Bytes,
    captured: Arc<Mutex<Vec<Captured>>>,
}

/// Throwaway voice API on an ephemeral port. Answers every `POST /tts`
/// with the configured status and body, recording what it received.
pub struct MockUpstream {
    pub base_url: String,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub async fn audio(bytes: &'static [u8]) -> Self {
        Self::start(StatusCode::OK, "audio/mpeg", Bytes::from_static(bytes)).await
    }

    pub async fn failing(status: StatusCode, body: &'static str) -> Self {
        Self::start(status, "text/plain", Bytes::from_static(body.as_bytes())).await
    }

    async fn start(status: StatusCode, content_type: &'static str, body: Bytes) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            content_type,
            body,
            captured: captured.clone(),
        };
        let app = Router::new().route("/v1/tts", post(handle)).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock upstream");
        let addr: SocketAddr = listener.local_addr().expect("mock addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            captured,
        }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().expect("captured lock").clone()
    }
}

async fn handle(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state
        .captured
        .lock()
        .expect("captured lock")
        .push(Captured { authorization, body });

    (
        state.status,
        [(header::CONTENT_TYPE, state.content_type)],
        state.body,
    )
}
