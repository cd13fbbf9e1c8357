//! Speak requests and the cooldown gate in front of the speak collaborator.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SpeechConfig;
use crate::emotion::Emotion;
use crate::voice::FallbackProsody;

/// Everything the host needs to voice one utterance, remotely or locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakRequest {
    pub text: String,
    pub voice_reference_id: String,
    pub speed: f64,
    pub volume_db: f64,
    pub emotion: Emotion,
    pub fallback: FallbackProsody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SpeakOutcome {
    Dispatched(SpeakRequest),
    #[serde(rename_all = "camelCase")]
    OnCooldown { remaining_ms: f64 },
    NothingToSay,
}

/// Speak collaborator. Implementations must not block.
pub trait Speaker {
    fn speak(&mut self, request: &SpeakRequest);
}

impl<F> Speaker for F
where
    F: FnMut(&SpeakRequest),
{
    fn speak(&mut self, request: &SpeakRequest) {
        self(request)
    }
}

#[derive(Debug, Clone)]
pub struct SpeakGate {
    config: SpeechConfig,
    last_dispatch: Option<f64>,
}

impl SpeakGate {
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            last_dispatch: None,
        }
    }

    /// Build the request for `text` spoken with `emotion`, or report why not.
    /// Only a dispatched request starts the cooldown.
    pub fn request(&mut self, text: &str, emotion: Emotion, now: f64) -> SpeakOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SpeakOutcome::NothingToSay;
        }

        if let Some(last) = self.last_dispatch {
            let elapsed = now - last;
            if elapsed < self.config.cooldown_ms {
                let remaining_ms = self.config.cooldown_ms - elapsed;
                debug!(remaining_ms, "speak suppressed by cooldown");
                return SpeakOutcome::OnCooldown { remaining_ms };
            }
        }

        self.last_dispatch = Some(now);
        let voice = self.config.voices.get(emotion);
        SpeakOutcome::Dispatched(SpeakRequest {
            text: text.to_string(),
            voice_reference_id: self.config.voice_reference_id.clone(),
            speed: voice.params.speed,
            volume_db: voice.params.volume_db,
            emotion,
            fallback: voice.fallback,
        })
    }
}
