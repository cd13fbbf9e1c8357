//! Debounces per-frame emotion labels into one held value.
//!
//! Two windows vote on every observation:
//!
//! - the whole buffer, whose majority needs `agreement_threshold` of the
//!   entries;
//! - the most recent `recent_window` entries, whose majority needs
//!   `recent_min_agreeing` of them. This fast path reacts to a genuine
//!   change sooner but can never move the value to neutral; neutral has to
//!   win the full-buffer vote.
//!
//! A change locks the value for `lock_ms`. While locked the buffer and the
//! displayed confidence keep updating.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use super::{Emotion, EmotionSample, Tally};
use crate::config::StabilizerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionReading {
    pub current: Emotion,
    pub confidence: f64,
    pub locked_until: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionChange {
    pub from: Emotion,
    pub to: Emotion,
    pub locked_until: f64,
}

#[derive(Debug, Clone)]
pub struct EmotionStabilizer {
    config: StabilizerConfig,
    buffer: VecDeque<Emotion>,
    current: Emotion,
    confidence: f64,
    locked_until: f64,
}

impl EmotionStabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        let capacity = config.capacity;
        Self {
            config,
            buffer: VecDeque::with_capacity(capacity),
            current: Emotion::Neutral,
            confidence: 0.0,
            locked_until: f64::NEG_INFINITY,
        }
    }

    pub fn observe(&mut self, sample: EmotionSample, now: f64) -> Option<EmotionChange> {
        if self.buffer.len() == self.config.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(sample.label);
        self.confidence = sample.confidence;

        if now < self.locked_until {
            return None;
        }

        let winner = self.fast_path().or_else(|| self.consensus())?;
        let change = EmotionChange {
            from: self.current,
            to: winner,
            locked_until: now + self.config.lock_ms,
        };
        self.current = winner;
        self.locked_until = change.locked_until;
        debug!(from = %change.from, to = %change.to, "emotion changed");
        Some(change)
    }

    fn fast_path(&self) -> Option<Emotion> {
        let window = self.config.recent_window;
        if self.buffer.len() < window {
            return None;
        }
        let recent = Tally::of(self.buffer.iter().skip(self.buffer.len() - window));
        let (label, count) = recent.leader()?;
        (count >= self.config.recent_min_agreeing
            && label != self.current
            && label != Emotion::Neutral)
            .then_some(label)
    }

    fn consensus(&self) -> Option<Emotion> {
        let (label, count) = Tally::of(&self.buffer).leader()?;
        let ratio = count as f64 / self.buffer.len() as f64;
        (ratio >= self.config.agreement_threshold && label != self.current).then_some(label)
    }

    pub fn current(&self) -> Emotion {
        self.current
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn locked_until(&self) -> f64 {
        self.locked_until
    }

    pub fn reading(&self) -> EmotionReading {
        EmotionReading {
            current: self.current,
            confidence: self.confidence,
            locked_until: self.locked_until,
        }
    }

    /// Oldest first.
    pub fn buffer(&self) -> impl Iterator<Item = Emotion> + '_ {
        self.buffer.iter().copied()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.current = Emotion::Neutral;
        self.confidence = 0.0;
        self.locked_until = f64::NEG_INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn stabilizer() -> EmotionStabilizer {
        EmotionStabilizer::new(StabilizerConfig::default())
    }

    fn sample(label: Emotion) -> EmotionSample {
        EmotionSample::new(label, 0.8)
    }

    fn feed(s: &mut EmotionStabilizer, labels: &[Emotion], start: f64, step: f64) {
        for (i, label) in labels.iter().enumerate() {
            s.observe(sample(*label), start + i as f64 * step);
        }
    }

    #[test]
    fn buffer_is_bounded_fifo() {
        use Emotion::*;
        let mut s = stabilizer();
        feed(&mut s, &[Happy, Sad, Angry, Surprised, Neutral, Sad], 0.0, 10.0);
        assert_eq!(s.buffer().collect::<Vec<_>>(), vec![Angry, Surprised, Neutral, Sad]);
    }

    #[test]
    fn two_of_three_recent_switch_immediately() {
        use Emotion::*;
        let mut s = stabilizer();
        s.observe(sample(Happy), 0.0);
        // Single sample is a full-buffer majority on its own.
        assert_eq!(s.current(), Happy);

        let mut s = stabilizer();
        feed(&mut s, &[Neutral, Neutral, Neutral, Neutral], 0.0, 10.0);
        assert_eq!(s.current(), Neutral);
        s.observe(sample(Sad), 40.0);
        assert_eq!(s.current(), Neutral);
        let change = s.observe(sample(Sad), 50.0).expect("fast path");
        assert_eq!(change.from, Neutral);
        assert_eq!(change.to, Sad);
        assert_eq!(change.locked_until, 2050.0);
    }

    #[test]
    fn lock_holds_value_but_tracks_confidence() {
        use Emotion::*;
        let mut s = stabilizer();
        s.observe(sample(Happy), 0.0);
        assert_eq!(s.locked_until(), 2000.0);

        for (i, c) in [0.4, 0.5, 0.6, 0.7].iter().enumerate() {
            let now = 100.0 + i as f64 * 100.0;
            assert!(s.observe(EmotionSample::new(Angry, *c), now).is_none());
            assert_eq!(s.current(), Happy);
            assert_eq!(s.confidence(), *c);
        }

        // Lock expired; the buffer is all angry now.
        let change = s.observe(sample(Angry), 2000.0).unwrap();
        assert_eq!(change.to, Angry);
    }

    #[test]
    fn single_neutral_does_not_drop_happy() {
        use Emotion::*;
        let mut s = stabilizer();
        feed(&mut s, &[Happy, Happy, Happy], 0.0, 10.0);
        assert_eq!(s.current(), Happy);

        // Well past the lock.
        assert!(s.observe(sample(Neutral), 5000.0).is_none());
        assert_eq!(s.current(), Happy);
    }

    #[test]
    fn recent_neutral_majority_needs_full_buffer_vote() {
        use Emotion::*;
        let mut s = EmotionStabilizer::new(StabilizerConfig {
            agreement_threshold: 0.75,
            ..StabilizerConfig::default()
        });
        feed(&mut s, &[Happy, Happy, Happy], 0.0, 10.0);
        assert_eq!(s.current(), Happy);

        // Recent window is [H, N, N]; the whole buffer splits 2:2.
        assert!(s.observe(sample(Neutral), 5000.0).is_none());
        assert!(s.observe(sample(Neutral), 5010.0).is_none());
        assert_eq!(s.current(), Happy);
    }

    #[test]
    fn neutral_wins_by_full_buffer_majority() {
        use Emotion::*;
        let mut s = stabilizer();
        s.observe(sample(Happy), 0.0);
        feed(&mut s, &[Neutral, Neutral], 3000.0, 10.0);
        // Two of three in the buffer carries the full-buffer vote.
        assert_eq!(s.current(), Neutral);
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = stabilizer();
        s.observe(sample(Emotion::Angry), 0.0);
        s.reset();
        assert_eq!(s.buffer().count(), 0);
        assert_eq!(s.reading().current, Emotion::Neutral);
        assert!(s.observe(sample(Emotion::Sad), 1.0).is_some());
    }

    fn any_emotion() -> impl Strategy<Value = Emotion> {
        prop::sample::select(Emotion::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn buffer_never_exceeds_capacity(labels in prop::collection::vec(any_emotion(), 0..40)) {
            let mut s = stabilizer();
            for (i, label) in labels.iter().enumerate() {
                s.observe(sample(*label), i as f64 * 100.0);
                prop_assert!(s.buffer().count() <= 4);
            }
        }

        #[test]
        fn value_never_changes_inside_lock(labels in prop::collection::vec(any_emotion(), 1..40)) {
            let mut s = stabilizer();
            let mut last_change: Option<f64> = None;
            for (i, label) in labels.iter().enumerate() {
                let now = i as f64 * 150.0;
                if let Some(change) = s.observe(sample(*label), now) {
                    if let Some(at) = last_change {
                        prop_assert!(now - at >= 2000.0);
                    }
                    prop_assert!(change.locked_until > now);
                    last_change = Some(now);
                }
            }
        }
    }
}
