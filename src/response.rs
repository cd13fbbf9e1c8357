use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::tts_client::TtsError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub is_operational: bool,
}

impl AppError {
    fn operational(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            is_operational: true,
        }
    }

    pub fn bad_request(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn validation(message: &str) -> Self {
        Self::bad_request("VALIDATION_ERROR", message)
    }

    pub fn too_many_requests(message: &str) -> Self {
        Self::operational(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", message)
    }

    pub fn payload_too_large(message: &str) -> Self {
        Self::operational(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", message)
    }

    pub fn bad_gateway(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::BAD_GATEWAY, code, message)
    }

    pub fn service_unavailable(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::SERVICE_UNAVAILABLE, code, message)
    }

    /// Operational error with an arbitrary status, e.g. relayed from upstream.
    pub fn with_status(status: StatusCode, code: &str, message: &str) -> Self {
        Self::operational(status, code, message)
    }

    pub fn internal(message: &str) -> Self {
        Self {
            is_operational: false,
            ..Self::operational(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (exposed_message, details) = if self.is_operational {
            (self.message.clone(), self.details.clone())
        } else {
            ("Internal server error".to_string(), None)
        };

        if self.is_operational {
            tracing::warn!(status = %self.status, code = %self.code, error = %self.message, "API error");
        } else {
            tracing::error!(status = %self.status, code = %self.code, error = %self.message, "Internal API error");
        }

        (
            self.status,
            Json(ErrorBody {
                success: false,
                code: self.code,
                message: exposed_message,
                trace_id: None,
                details,
            }),
        )
            .into_response()
    }
}

impl From<TtsError> for AppError {
    fn from(value: TtsError) -> Self {
        match value {
            TtsError::NotConfigured => AppError::service_unavailable(
                "TTS_NOT_CONFIGURED",
                "Text-to-speech API key is not configured",
            ),
            TtsError::Timeout => {
                AppError::bad_gateway("TTS_UNREACHABLE", "Text-to-speech API timed out")
            }
            TtsError::Network(msg) => {
                AppError::bad_gateway("TTS_UNREACHABLE", "Failed to reach text-to-speech API")
                    .with_details(msg)
            }
            TtsError::Upstream { status, body } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                AppError::with_status(
                    status,
                    "TTS_UPSTREAM_ERROR",
                    &format!("Text-to-speech API error: {}", status.as_u16()),
                )
                .with_details(body)
            }
        }
    }
}
