mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use tower::util::ServiceExt;

use common::app::{spawn_offline_app, spawn_test_app};
use common::http::{assert_json_error, request, response_bytes, response_json};
use common::upstream::MockUpstream;

#[tokio::test]
async fn it_tts_relays_audio_and_forwards_body() {
    let upstream = MockUpstream::audio(b"ID3-fake-mp3").await;
    let app = spawn_test_app(&upstream.base_url, "secret-key", 100);

    let resp = request(
        &app.app,
        Method::POST,
        "/tts",
        Some(json!({
            "text": "hello there",
            "reference_id": "voice-42",
            "emotion": "happy",
            "normalize": true
        })),
        &[],
    )
    .await;
    let (status, headers, bytes) = response_bytes(resp).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "audio/mpeg");
    assert_eq!(bytes, b"ID3-fake-mp3");

    let seen = upstream.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret-key"));

    let body = &seen[0].body;
    assert_eq!(body["text"], "hello there");
    assert_eq!(body["reference_id"], "voice-42");
    assert_eq!(body["format"], "mp3");
    assert_eq!(body["normalize"], true);
    assert_eq!(body["prosody"]["speed"], 1.3);
    assert_eq!(body["prosody"]["volume"], 0.0);
    assert!(body.get("emotion").is_none());
}

#[tokio::test]
async fn it_tts_relays_upstream_error_status() {
    let upstream = MockUpstream::failing(StatusCode::PAYMENT_REQUIRED, "insufficient balance").await;
    let app = spawn_test_app(&upstream.base_url, "secret-key", 100);

    let resp = request(&app.app, Method::POST, "/tts", Some(json!({"text": "hi"})), &[]).await;
    let (status, _, body) = response_json(resp).await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_json_error(&body, "TTS_UPSTREAM_ERROR");
    assert_eq!(body["details"], "insufficient balance");
    assert!(body["traceId"].is_string());
}

#[tokio::test]
async fn it_tts_unreachable_upstream_is_bad_gateway() {
    let app = spawn_offline_app();

    let resp = request(&app.app, Method::POST, "/tts", Some(json!({"text": "hi"})), &[]).await;
    let (status, _, body) = response_json(resp).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_json_error(&body, "TTS_UNREACHABLE");
}

#[tokio::test]
async fn it_tts_without_key_is_unavailable() {
    let upstream = MockUpstream::audio(b"never").await;
    let app = spawn_test_app(&upstream.base_url, "", 100);

    let resp = request(&app.app, Method::POST, "/tts", Some(json!({"text": "hi"})), &[]).await;
    let (status, _, body) = response_json(resp).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_json_error(&body, "TTS_NOT_CONFIGURED");
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn it_tts_rejects_blank_and_oversized_text() {
    let app = spawn_offline_app();

    for payload in [
        json!({"text": "   "}),
        json!({"text": "x".repeat(app.config.tts.max_text_chars + 1)}),
        json!({"reference_id": "missing-text"}),
        json!({"text": "hi", "emotion": "bored"}),
    ] {
        let resp = request(&app.app, Method::POST, "/tts", Some(payload), &[]).await;
        let (status, _, body) = response_json(resp).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_json_error(&body, "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn it_tts_body_limit_is_json_413() {
    let app = spawn_offline_app();

    let resp = request(
        &app.app,
        Method::POST,
        "/tts",
        Some(json!({"text": "a".repeat(70 * 1024)})),
        &[],
    )
    .await;
    let (status, _, body) = response_json(resp).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_json_error(&body, "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn it_tts_requires_json_content_type() {
    let app = spawn_offline_app();

    let req = Request::builder()
        .method(Method::POST)
        .uri("/tts")
        .header("content-type", "text/plain")
        .body(Body::from("hello"))
        .expect("request");
    let resp = app.app.clone().oneshot(req).await.expect("oneshot");
    let (status, _, body) = response_json(resp).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_json_error(&body, "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn it_request_id_is_echoed_and_traced() {
    let app = spawn_offline_app();

    let resp = request(
        &app.app,
        Method::POST,
        "/tts",
        Some(json!({"text": ""})),
        &[("x-request-id", "client-abc_1".to_string())],
    )
    .await;
    let (_, headers, body) = response_json(resp).await;

    assert_eq!(headers["x-request-id"], "client-abc_1");
    assert_eq!(body["traceId"], "client-abc_1");
}

#[tokio::test]
async fn it_unknown_route_is_json_404() {
    let app = spawn_offline_app();

    let resp = request(&app.app, Method::GET, "/voices", None, &[]).await;
    let (status, headers, body) = response_json(resp).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
    assert!(headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn it_wrong_method_is_json_405() {
    let app = spawn_offline_app();

    let resp = request(&app.app, Method::GET, "/tts", None, &[]).await;
    let (status, headers, body) = response_json(resp).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_json_error(&body, "METHOD_NOT_ALLOWED");
    assert_eq!(body["traceId"], headers["x-request-id"].to_str().unwrap());
}
