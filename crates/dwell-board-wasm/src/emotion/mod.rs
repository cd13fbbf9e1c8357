//! Emotion pipeline: classifier throttle, expression scoring and the
//! stabilizer that turns noisy per-frame labels into one held emotion.

pub mod scoring;
pub mod stabilizer;
pub mod throttle;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use scoring::{score_expressions, ExpressionScores};
pub use stabilizer::{EmotionChange, EmotionReading, EmotionStabilizer};
pub use throttle::{ClassificationTicket, ClassifierThrottle, ThrottleSkip};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    #[default]
    Neutral,
    Surprised,
    Angry,
}

impl Emotion {
    /// Fixed order used for counting and tie-breaking.
    pub const ALL: [Emotion; 5] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Neutral,
        Emotion::Surprised,
        Emotion::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Neutral => "neutral",
            Self::Surprised => "surprised",
            Self::Angry => "angry",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Happy => 0,
            Self::Sad => 1,
            Self::Neutral => 2,
            Self::Surprised => 3,
            Self::Angry => 4,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion: {0}")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "sad" => Ok(Self::Sad),
            "neutral" => Ok(Self::Neutral),
            "surprised" => Ok(Self::Surprised),
            "angry" => Ok(Self::Angry),
            other => Err(UnknownEmotion(other.to_string())),
        }
    }
}

/// One classified frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionSample {
    pub label: Emotion,
    pub confidence: f64,
}

impl EmotionSample {
    pub fn new(label: Emotion, confidence: f64) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Per-label tally in [`Emotion::ALL`] order.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Tally([usize; 5]);

impl Tally {
    pub(crate) fn of<'a>(labels: impl IntoIterator<Item = &'a Emotion>) -> Self {
        let mut counts = [0; 5];
        for label in labels {
            counts[label.index()] += 1;
        }
        Self(counts)
    }

    pub(crate) fn count(&self, emotion: Emotion) -> usize {
        self.0[emotion.index()]
    }

    /// Most frequent label; the earliest in [`Emotion::ALL`] wins ties.
    pub(crate) fn leader(&self) -> Option<(Emotion, usize)> {
        let mut best: Option<(Emotion, usize)> = None;
        for emotion in Emotion::ALL {
            let count = self.count(emotion);
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((emotion, count));
            }
        }
        best
    }
}
