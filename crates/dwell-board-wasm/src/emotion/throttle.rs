//! Rate limiting and reentrancy guard around the expression classifier.
//!
//! Classification is asynchronous on the host side, so a request is split
//! into [`ClassifierThrottle::try_begin`], which hands out a ticket, and
//! [`ClassifierThrottle::complete`], which consumes it. Only the ticket that
//! currently holds the in-flight guard is accepted; anything else is a late
//! answer from before a reset and is dropped.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::scoring::{score_expressions, ExpressionScores};
use super::{Emotion, EmotionSample};
use crate::config::{ScoringConfig, ThrottleConfig};
use crate::error::ClassifierError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationTicket(u32);

impl ClassificationTicket {
    pub fn id(self) -> u32 {
        self.0
    }

    /// Rebuild a ticket handed across the JS boundary as a plain number.
    pub fn from_id(id: u32) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ThrottleSkip {
    /// A classification is already in flight.
    Busy,
    /// The previous request started less than the minimum interval ago.
    Throttled,
    /// Tracking is stopped; reported by the board, never by the throttle.
    NotTracking,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: ClassificationTicket,
    since: f64,
}

#[derive(Debug, Clone)]
pub struct ClassifierThrottle {
    config: ThrottleConfig,
    scoring: ScoringConfig,
    in_flight: Option<InFlight>,
    last_started: Option<f64>,
    next_id: u32,
}

impl ClassifierThrottle {
    pub fn new(config: ThrottleConfig, scoring: ScoringConfig) -> Self {
        Self {
            config,
            scoring,
            in_flight: None,
            last_started: None,
            next_id: 1,
        }
    }

    pub fn try_begin(&mut self, now: f64) -> Result<ClassificationTicket, ThrottleSkip> {
        if let Some(pending) = self.in_flight {
            let held = now - pending.since;
            if held <= self.config.stuck_after_ms {
                return Err(ThrottleSkip::Busy);
            }
            warn!(
                ticket = pending.ticket.id(),
                held_ms = held,
                "classifier guard held too long, force-clearing"
            );
            self.in_flight = None;
        }

        if let Some(last) = self.last_started {
            if now - last < self.config.min_interval_ms {
                return Err(ThrottleSkip::Throttled);
            }
        }

        let ticket = ClassificationTicket(self.next_id);
        // Ids keep counting across resets so old tickets never match again.
        self.next_id = self.next_id.wrapping_add(1);
        self.in_flight = Some(InFlight { ticket, since: now });
        self.last_started = Some(now);
        Ok(ticket)
    }

    /// Release the guard and turn the classifier's answer into a sample.
    ///
    /// `Ok(None)` means no face was found. Both that and a classifier fault
    /// produce the low-confidence neutral fallback. Returns `None` only for
    /// a ticket that no longer holds the guard.
    pub fn complete(
        &mut self,
        ticket: ClassificationTicket,
        outcome: Result<Option<ExpressionScores>, ClassifierError>,
    ) -> Option<EmotionSample> {
        match self.in_flight {
            Some(pending) if pending.ticket == ticket => self.in_flight = None,
            _ => {
                debug!(ticket = ticket.id(), "discarding stale classification");
                return None;
            }
        }

        let sample = match outcome {
            Ok(Some(scores)) => score_expressions(&scores, &self.scoring),
            Ok(None) => self.fallback(),
            Err(err) => {
                warn!(error = %err, "expression classifier failed, using fallback");
                self.fallback()
            }
        };
        Some(sample)
    }

    /// Synchronous convenience: begin, run `classify`, complete.
    /// `classify` is not called when the request is skipped.
    pub fn maybe_classify<F>(&mut self, now: f64, classify: F) -> Option<EmotionSample>
    where
        F: FnOnce() -> Result<Option<ExpressionScores>, ClassifierError>,
    {
        let ticket = self.try_begin(now).ok()?;
        self.complete(ticket, classify())
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn reset(&mut self) {
        self.in_flight = None;
        self.last_started = None;
    }

    fn fallback(&self) -> EmotionSample {
        EmotionSample::new(Emotion::Neutral, self.config.fallback_confidence)
    }
}
