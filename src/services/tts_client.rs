use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;

use crate::config::TtsConfig;

const DEFAULT_AUDIO_TYPE: &str = "audio/mpeg";

/// Client for the remote text-to-speech API.
#[derive(Debug, Clone)]
pub struct TtsClient {
    config: TtsConfig,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("tts api key is not configured")]
    NotConfigured,
    #[error("tts request timed out")]
    Timeout,
    #[error("tts network error: {0}")]
    Network(String),
    #[error("tts api error: status={status}")]
    Upstream { status: u16, body: String },
}

impl TtsClient {
    pub fn new(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint: format!("{}/tts", config.api_url.trim_end_matches('/')),
            config: config.clone(),
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `payload` to the synthesis endpoint and return the audio as-is.
    pub async fn synthesize(&self, payload: &serde_json::Value) -> Result<SynthesizedAudio, TtsError> {
        if !self.is_configured() {
            return Err(TtsError::NotConfigured);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.config.api_key.trim())
            .json(payload)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_AUDIO_TYPE)
            .to_string();
        let bytes = response.bytes().await.map_err(classify_transport_error)?;

        tracing::debug!(status = status.as_u16(), bytes = bytes.len(), %content_type, "tts audio received");
        Ok(SynthesizedAudio {
            content_type,
            bytes,
        })
    }
}

fn classify_transport_error(err: reqwest::Error) -> TtsError {
    if err.is_timeout() {
        TtsError::Timeout
    } else {
        TtsError::Network(err.to_string())
    }
}
