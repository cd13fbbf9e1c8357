use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use dwell_board_wasm::Emotion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::response::AppError;
use crate::state::AppState;

const DEFAULT_FORMAT: &str = "mp3";

pub fn router() -> Router<AppState> {
    Router::new().route("/tts", post(synthesize))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prosody {
    pub speed: f64,
    pub volume: f64,
}

/// Body accepted by `POST /tts`. Fields the proxy does not interpret are
/// kept in `extra` and forwarded untouched.
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub prosody: Option<Prosody>,
    #[serde(default)]
    pub emotion: Option<Emotion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

async fn synthesize(
    State(state): State<AppState>,
    body: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = body.map_err(rejection_to_error)?;
    validate_text(&req.text, state.config().tts.max_text_chars)?;

    let chars = req.text.chars().count();
    let emotion = req.emotion;
    let payload = upstream_payload(req, &state);

    tracing::info!(chars, emotion = ?emotion, "tts request forwarded");
    let audio = state.tts().synthesize(&payload).await?;

    Ok((
        [
            (header::CONTENT_TYPE, audio.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        audio.bytes,
    ))
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::payload_too_large("Request body is too large"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => AppError::with_status(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UNSUPPORTED_MEDIA_TYPE",
            "Expected a JSON body with content-type application/json",
        ),
        _ => AppError::validation(&rejection.body_text()),
    }
}

fn validate_text(text: &str, max_chars: usize) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::validation("text must not be empty"));
    }
    let chars = text.chars().count();
    if chars > max_chars {
        return Err(AppError::validation(&format!(
            "text is too long ({chars} > {max_chars} characters)"
        )));
    }
    Ok(())
}

/// Upstream body: passthrough fields, then the interpreted ones. Emotion
/// only selects prosody and is not forwarded.
fn upstream_payload(req: TtsRequest, state: &AppState) -> Value {
    let prosody = req.prosody.or_else(|| {
        req.emotion.map(|emotion| {
            let params = state.voices().params(emotion);
            Prosody {
                speed: params.speed,
                volume: params.volume_db,
            }
        })
    });

    let mut body = req.extra;
    body.insert("text".to_string(), Value::String(req.text));
    if let Some(reference_id) = req.reference_id {
        body.insert("reference_id".to_string(), Value::String(reference_id));
    }
    body.insert(
        "format".to_string(),
        Value::String(req.format.unwrap_or_else(|| DEFAULT_FORMAT.to_string())),
    );
    if let Some(prosody) = prosody {
        body.insert(
            "prosody".to_string(),
            serde_json::to_value(prosody).unwrap_or(Value::Null),
        );
    }
    Value::Object(body)
}
