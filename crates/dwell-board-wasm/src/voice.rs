//! Emotion → voice parameters.
//!
//! `speed`/`volume_db` go to the remote synthesis API. `rate`/`pitch` are
//! for the browser's local synthesizer when the remote call fails.

use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParams {
    pub speed: f64,
    pub volume_db: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackProsody {
    pub rate: f64,
    pub pitch: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionVoice {
    #[serde(flatten)]
    pub params: VoiceParams,
    pub fallback: FallbackProsody,
}

const fn voice(speed: f64, volume_db: f64, rate: f64, pitch: f64) -> EmotionVoice {
    EmotionVoice {
        params: VoiceParams { speed, volume_db },
        fallback: FallbackProsody { rate, pitch },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceTable {
    pub happy: EmotionVoice,
    pub sad: EmotionVoice,
    pub neutral: EmotionVoice,
    pub surprised: EmotionVoice,
    pub angry: EmotionVoice,
}

impl Default for VoiceTable {
    fn default() -> Self {
        Self {
            happy: voice(1.3, 0.0, 1.1, 1.1),
            sad: voice(0.6, -3.0, 0.9, 0.9),
            neutral: voice(1.0, 0.0, 1.0, 1.0),
            surprised: voice(1.5, 2.0, 1.15, 1.2),
            angry: voice(1.3, 5.0, 1.05, 0.95),
        }
    }
}

impl VoiceTable {
    pub fn get(&self, emotion: Emotion) -> &EmotionVoice {
        match emotion {
            Emotion::Happy => &self.happy,
            Emotion::Sad => &self.sad,
            Emotion::Neutral => &self.neutral,
            Emotion::Surprised => &self.surprised,
            Emotion::Angry => &self.angry,
        }
    }

    pub fn params(&self, emotion: Emotion) -> VoiceParams {
        self.get(emotion).params
    }

    pub fn fallback(&self, emotion: Emotion) -> FallbackProsody {
        self.get(emotion).fallback
    }
}
