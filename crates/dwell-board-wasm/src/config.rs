//! Engine tunables.
//!
//! Every knob the board exposes lives here as a named field. The browser
//! passes a (possibly partial) camelCase object; missing fields take the
//! defaults below.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pointer::Surface;
use crate::target::HoverStrategy;
use crate::voice::VoiceTable;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub pointer: PointerConfig,
    pub hover: HoverConfig,
    pub dwell: DwellConfig,
    pub throttle: ThrottleConfig,
    pub scoring: ScoringConfig,
    pub stabilizer: StabilizerConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PointerConfig {
    /// EMA factor in (0, 1]. Lower is smoother with more lag.
    pub smoothing_factor: f64,
    pub sensitivity_x: f64,
    /// Vertical nose travel is shorter than horizontal, so this is tuned separately.
    pub sensitivity_y: f64,
    /// Added after mirroring, before sensitivity, to recenter the resting position.
    pub offset_x: f64,
    pub offset_y: f64,
    /// Mirror horizontally to match a mirrored camera preview.
    pub mirror_x: bool,
    pub surface: Surface,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.25,
            sensitivity_x: 4.1,
            sensitivity_y: 4.2,
            offset_x: 0.0,
            offset_y: 0.0,
            mirror_x: true,
            surface: Surface::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HoverConfig {
    pub strategy: HoverStrategy,
    pub cursor_radius_px: f64,
    /// Fraction of the cursor disc that must cover a target before it is eligible.
    pub min_overlap_ratio: f64,
    /// Rectangles are inflated by this much for the point-in-rect test.
    pub edge_tolerance_px: f64,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            strategy: HoverStrategy::OverlapRatio,
            cursor_radius_px: 20.0,
            min_overlap_ratio: 0.35,
            edge_tolerance_px: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DwellConfig {
    pub dwell_ms: f64,
    /// A new target must be the unbroken resolution result this long before it is armed.
    /// Zero arms immediately.
    pub hysteresis_ms: f64,
    pub pulse_ms: f64,
    pub auto_repeat: bool,
    pub repeat_interval_ms: f64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            dwell_ms: 750.0,
            hysteresis_ms: 70.0,
            pulse_ms: 250.0,
            auto_repeat: false,
            repeat_interval_ms: 900.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThrottleConfig {
    pub min_interval_ms: f64,
    /// An in-flight guard older than this is considered wedged and force-cleared.
    pub stuck_after_ms: f64,
    pub fallback_confidence: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 350.0,
            stuck_after_ms: 2000.0,
            fallback_confidence: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    /// A non-neutral score below this never overrides neutral.
    pub min_score: f64,
    /// Neutral at or above this is dominant unless the best non-neutral is close.
    pub neutral_dominance: f64,
    pub override_margin: f64,
    pub max_confidence: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: 0.15,
            neutral_dominance: 0.6,
            override_margin: 0.2,
            max_confidence: 0.99,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StabilizerConfig {
    pub capacity: usize,
    /// Share of the whole buffer the majority label needs.
    pub agreement_threshold: f64,
    pub recent_window: usize,
    /// How many of the recent window must agree for the fast path.
    pub recent_min_agreeing: usize,
    pub lock_ms: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            agreement_threshold: 0.5,
            recent_window: 3,
            recent_min_agreeing: 2,
            lock_ms: 2000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechConfig {
    pub cooldown_ms: f64,
    pub voice_reference_id: String,
    pub voices: VoiceTable,
}

pub const DEFAULT_VOICE_REFERENCE_ID: &str = "7d4e8a6444a442eb819c69981fdb8315";

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 1500.0,
            voice_reference_id: DEFAULT_VOICE_REFERENCE_ID.to_string(),
            voices: VoiceTable::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pointer;
        if !(p.smoothing_factor > 0.0 && p.smoothing_factor <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "pointer.smoothingFactor",
                range: "(0, 1]",
                value: p.smoothing_factor,
            });
        }
        positive("pointer.sensitivityX", p.sensitivity_x)?;
        positive("pointer.sensitivityY", p.sensitivity_y)?;
        positive("pointer.surface.width", p.surface.width)?;
        positive("pointer.surface.height", p.surface.height)?;

        let h = &self.hover;
        positive("hover.cursorRadiusPx", h.cursor_radius_px)?;
        unit_interval("hover.minOverlapRatio", h.min_overlap_ratio)?;
        if h.edge_tolerance_px < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "hover.edgeTolerancePx",
                range: "[0, inf)",
                value: h.edge_tolerance_px,
            });
        }

        let d = &self.dwell;
        positive("dwell.dwellMs", d.dwell_ms)?;
        positive("dwell.repeatIntervalMs", d.repeat_interval_ms)?;
        non_negative("dwell.hysteresisMs", d.hysteresis_ms)?;
        non_negative("dwell.pulseMs", d.pulse_ms)?;

        let t = &self.throttle;
        non_negative("throttle.minIntervalMs", t.min_interval_ms)?;
        positive("throttle.stuckAfterMs", t.stuck_after_ms)?;
        unit_interval("throttle.fallbackConfidence", t.fallback_confidence)?;

        let sc = &self.scoring;
        unit_interval("scoring.minScore", sc.min_score)?;
        unit_interval("scoring.neutralDominance", sc.neutral_dominance)?;
        unit_interval("scoring.maxConfidence", sc.max_confidence)?;

        let s = &self.stabilizer;
        if s.capacity == 0 {
            return Err(ConfigError::NotPositive {
                field: "stabilizer.capacity",
            });
        }
        if s.recent_window == 0 {
            return Err(ConfigError::NotPositive {
                field: "stabilizer.recentWindow",
            });
        }
        if s.recent_window > s.capacity {
            return Err(ConfigError::RecentWindowTooLarge {
                window: s.recent_window,
                capacity: s.capacity,
            });
        }
        // One agreeing sample would let a single frame flip the emotion.
        if s.recent_min_agreeing < 2 || s.recent_min_agreeing > s.recent_window {
            return Err(ConfigError::RecentAgreementOutOfRange {
                agreeing: s.recent_min_agreeing,
                window: s.recent_window,
            });
        }
        unit_interval("stabilizer.agreementThreshold", s.agreement_threshold)?;
        // Lock expiry has to land strictly in the future.
        positive("stabilizer.lockMs", s.lock_ms)?;

        non_negative("speech.cooldownMs", self.speech.cooldown_ms)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            range: "[0, inf)",
            value,
        })
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            range: "[0, 1]",
            value,
        })
    }
}
