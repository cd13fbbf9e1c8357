//! The board: one object owning every piece of interaction state.
//!
//! A [`TrackingSession`] exists only between [`Board::start`] and
//! [`Board::stop`]; dropping it is what cancels pending dwells, so nothing
//! armed before a stop can fire after it. Composed text survives a stop.

use serde::Serialize;
use tracing::{debug, info};

use crate::compose::{Command, ComposedText, Dictionary, Interpreter};
use crate::config::EngineConfig;
use crate::dwell::{DwellEvent, DwellMachine, DwellSnapshot};
use crate::emotion::{
    ClassificationTicket, ClassifierThrottle, EmotionChange, EmotionReading, EmotionSample,
    EmotionStabilizer, ExpressionScores, ThrottleSkip,
};
use crate::error::{ClassifierError, EngineError};
use crate::pointer::{CursorMapper, CursorState, PointerSmoother, RawPoint, Surface};
use crate::speech::{SpeakGate, SpeakOutcome, Speaker};
use crate::target::{TargetProvider, TargetResolver};

/// Result of one key value, whether it came from a dwell or a keyboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum KeyOutcome {
    Edited(ComposedText),
    Speech(SpeakOutcome),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameReport {
    pub cursor: Option<CursorState>,
    pub hovered_id: Option<String>,
    pub dwell: DwellSnapshot,
    pub events: Vec<DwellEvent>,
    pub key_outcomes: Vec<KeyOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionUpdate {
    pub sample: EmotionSample,
    pub change: Option<EmotionChange>,
    pub reading: EmotionReading,
}

#[derive(Debug)]
struct TrackingSession {
    started_at: f64,
    smoother: PointerSmoother,
    dwell: DwellMachine,
    cursor: Option<CursorState>,
}

impl TrackingSession {
    fn new(config: &EngineConfig, now: f64) -> Self {
        Self {
            started_at: now,
            smoother: PointerSmoother::new(config.pointer.smoothing_factor),
            dwell: DwellMachine::new(config.dwell.clone()),
            cursor: None,
        }
    }
}

pub struct Board<S: Speaker> {
    config: EngineConfig,
    mapper: CursorMapper,
    resolver: TargetResolver,
    interpreter: Interpreter,
    composed: ComposedText,
    gate: SpeakGate,
    speaker: S,
    throttle: ClassifierThrottle,
    stabilizer: EmotionStabilizer,
    session: Option<TrackingSession>,
}

impl<S: Speaker> Board<S> {
    pub fn new(config: EngineConfig, speaker: S) -> Result<Self, EngineError> {
        Self::with_dictionary(config, Dictionary::default(), speaker)
    }

    pub fn with_dictionary(
        config: EngineConfig,
        dictionary: Dictionary,
        speaker: S,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            mapper: CursorMapper::from_config(&config.pointer),
            resolver: TargetResolver::from_config(&config.hover),
            interpreter: Interpreter::new(dictionary),
            composed: ComposedText::default(),
            gate: SpeakGate::new(config.speech.clone()),
            speaker,
            throttle: ClassifierThrottle::new(config.throttle.clone(), config.scoring.clone()),
            stabilizer: EmotionStabilizer::new(config.stabilizer.clone()),
            session: None,
            config,
        })
    }

    /// Begin a fresh tracking session. Restarting while tracking discards
    /// the running session first.
    pub fn start(&mut self, now: f64) {
        self.throttle.reset();
        self.stabilizer.reset();
        self.session = Some(TrackingSession::new(&self.config, now));
        info!(at = now, "tracking started");
    }

    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.throttle.reset();
        self.stabilizer.reset();
        info!(started_at = session.started_at, "tracking stopped");
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    /// Process one tracker frame: smooth, map, resolve, then tick the dwell
    /// machine. Selections are applied as key presses before returning.
    ///
    /// `point` is `None` when no face was found; the last cursor is kept and
    /// resolved again against the current targets.
    pub fn frame<P>(&mut self, now: f64, point: Option<RawPoint>, targets: &P) -> FrameReport
    where
        P: TargetProvider + ?Sized,
    {
        let Some(session) = self.session.as_mut() else {
            return FrameReport::default();
        };

        if let Some(raw) = point {
            let smoothed = session.smoother.update(raw);
            session.cursor = Some(self.mapper.map_smoothed(smoothed));
        }

        let resolved = session
            .cursor
            .as_ref()
            .and_then(|cursor| self.resolver.resolve(cursor, targets.targets()));
        let events = session.dwell.tick(now, resolved);
        let dwell = session.dwell.snapshot(now);
        let cursor = session.cursor;

        let mut key_outcomes = Vec::new();
        for event in &events {
            if let DwellEvent::Selected { target, .. } = event {
                key_outcomes.push(self.press(&target.value, now));
            }
        }

        FrameReport {
            cursor,
            hovered_id: resolved.map(|t| t.id.clone()),
            dwell,
            events,
            key_outcomes,
        }
    }

    pub fn begin_classification(&mut self, now: f64) -> Result<ClassificationTicket, ThrottleSkip> {
        if !self.is_tracking() {
            return Err(ThrottleSkip::NotTracking);
        }
        self.throttle.try_begin(now)
    }

    /// Feed the classifier's answer for `ticket` into the stabilizer.
    /// Returns `None` for a stale ticket or while stopped.
    pub fn complete_classification(
        &mut self,
        ticket: ClassificationTicket,
        outcome: Result<Option<ExpressionScores>, ClassifierError>,
        now: f64,
    ) -> Option<EmotionUpdate> {
        if !self.is_tracking() {
            return None;
        }
        let sample = self.throttle.complete(ticket, outcome)?;
        let change = self.stabilizer.observe(sample, now);
        Some(EmotionUpdate {
            sample,
            change,
            reading: self.stabilizer.reading(),
        })
    }

    pub fn maybe_classify<F>(&mut self, now: f64, classify: F) -> Option<EmotionUpdate>
    where
        F: FnOnce() -> Result<Option<ExpressionScores>, ClassifierError>,
    {
        let ticket = self.begin_classification(now).ok()?;
        self.complete_classification(ticket, classify(), now)
    }

    /// Apply one key value. Works whether or not tracking is running.
    pub fn press(&mut self, value: &str, now: f64) -> KeyOutcome {
        match Command::parse(value) {
            Command::Speak => {
                let emotion = self.stabilizer.current();
                let outcome = self.gate.request(&self.composed.text, emotion, now);
                if let SpeakOutcome::Dispatched(request) = &outcome {
                    debug!(%emotion, chars = request.text.chars().count(), "speaking");
                    self.speaker.speak(request);
                }
                KeyOutcome::Speech(outcome)
            }
            command => {
                self.composed = self.interpreter.apply(&command, &self.composed);
                KeyOutcome::Edited(self.composed.clone())
            }
        }
    }

    pub fn set_dictionary(&mut self, dictionary: Dictionary) {
        self.composed.suggestion = dictionary.suggest(&self.composed.text);
        self.interpreter = Interpreter::new(dictionary);
    }

    pub fn set_surface(&mut self, surface: Surface) {
        self.mapper.set_surface(surface);
    }

    pub fn surface(&self) -> Surface {
        self.mapper.surface()
    }

    pub fn text(&self) -> &str {
        &self.composed.text
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.composed.suggestion.as_deref()
    }

    pub fn emotion(&self) -> EmotionReading {
        self.stabilizer.reading()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn speaker(&self) -> &S {
        &self.speaker
    }
}
