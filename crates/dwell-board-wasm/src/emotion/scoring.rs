//! Probability vector → single labelled sample.

use serde::{Deserialize, Serialize};

use super::{Emotion, EmotionSample};
use crate::config::ScoringConfig;

/// Raw classifier output for one face. Fields missing from the host's
/// object count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionScores {
    pub neutral: f64,
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub fearful: f64,
    pub disgusted: f64,
    pub surprised: f64,
}

impl ExpressionScores {
    fn score(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Neutral => self.neutral,
            Emotion::Surprised => self.surprised,
            // Disgust reads as anger on this board.
            Emotion::Angry => self.angry + self.disgusted,
        }
    }
}

/// Non-neutral labels in tie-break order.
const EXPRESSIVE: [Emotion; 4] = [
    Emotion::Happy,
    Emotion::Sad,
    Emotion::Angry,
    Emotion::Surprised,
];

/// Pick the label for one frame.
///
/// Neutral is the default reading. The strongest expressive label replaces
/// it when it clears `min_score` and neutral is either not dominant or
/// only ahead by less than `override_margin`. After that any label with a
/// strictly higher score still wins.
pub fn score_expressions(scores: &ExpressionScores, config: &ScoringConfig) -> EmotionSample {
    let neutral = scores.score(Emotion::Neutral);

    let mut best = (Emotion::Happy, f64::MIN);
    for emotion in EXPRESSIVE {
        let s = scores.score(emotion);
        if s > best.1 {
            best = (emotion, s);
        }
    }

    let mut chosen = (Emotion::Neutral, neutral);
    let (best_label, best_score) = best;
    if best_score >= config.min_score
        && (neutral < config.neutral_dominance || best_score >= neutral - config.override_margin)
    {
        chosen = (best_label, best_score);
    }

    for emotion in Emotion::ALL {
        let s = scores.score(emotion);
        if s > chosen.1 {
            chosen = (emotion, s);
        }
    }

    EmotionSample::new(chosen.0, chosen.1.min(config.max_confidence))
}
