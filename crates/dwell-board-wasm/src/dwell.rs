//! Dwell selection state machine.
//!
//! `Idle → Candidate → Armed → Selecting → (Armed | Idle)`
//!
//! The machine is driven by [`DwellMachine::tick`] with the caller's clock
//! and the target resolved for that frame; it owns no timers. A new target
//! first becomes a candidate and is armed only after it has been the
//! unbroken resolution result for the hysteresis interval, so single-frame
//! jitter toward a neighbour neither arms the neighbour nor resets the
//! in-progress dwell. The dwell clock starts when the target was first
//! seen, which makes hover-to-select time equal to the dwell time.
//!
//! A dwell fires once per unbroken hover. With auto-repeat it fires again
//! every repeat interval while the same target stays resolved; without it
//! the target is spent until it is lost and re-acquired.

use serde::Serialize;
use tracing::debug;

use crate::config::DwellConfig;
use crate::target::InteractiveTarget;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DwellEvent {
    #[serde(rename_all = "camelCase")]
    Armed { target_id: String },
    #[serde(rename_all = "camelCase")]
    Cancelled { target_id: String },
    Selected { target: InteractiveTarget, repeat: bool },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DwellPhase {
    #[default]
    Idle,
    Candidate,
    Armed,
    Selecting,
}

/// What the UI needs to draw hover and progress feedback.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DwellSnapshot {
    pub phase: DwellPhase,
    pub target_id: Option<String>,
    pub candidate_id: Option<String>,
    /// Fraction of the running dwell (or repeat) interval elapsed, `0..=1`.
    pub progress: f64,
}

#[derive(Debug, Clone)]
struct Candidate {
    target: InteractiveTarget,
    since: f64,
}

#[derive(Debug, Clone, Copy)]
enum ArmPhase {
    Counting { from: f64, fire_at: f64, repeat: bool },
    Selecting { until: f64, next_fire_at: Option<f64> },
    Spent,
}

#[derive(Debug, Clone)]
struct Armed {
    target: InteractiveTarget,
    phase: ArmPhase,
}

#[derive(Debug, Clone)]
pub struct DwellMachine {
    config: DwellConfig,
    armed: Option<Armed>,
    candidate: Option<Candidate>,
}

impl DwellMachine {
    pub fn new(config: DwellConfig) -> Self {
        Self {
            config,
            armed: None,
            candidate: None,
        }
    }

    /// Advance the machine to `now` given this frame's resolution result.
    /// Emits at most one `Selected` per call.
    pub fn tick(&mut self, now: f64, resolved: Option<&InteractiveTarget>) -> Vec<DwellEvent> {
        let mut events = Vec::new();

        match resolved {
            None => {
                self.candidate = None;
                if let Some(old) = self.armed.take() {
                    events.push(DwellEvent::Cancelled {
                        target_id: old.target.id,
                    });
                }
            }
            Some(target) if self.armed_id() == Some(target.id.as_str()) => {
                self.candidate = None;
                if let Some(armed) = self.armed.as_mut() {
                    // Geometry or label may have changed; identity has not.
                    armed.target = target.clone();
                }
                self.advance(now, &mut events);
            }
            Some(target) => {
                let since = match &self.candidate {
                    Some(c) if c.target.id == target.id => c.since,
                    _ => {
                        self.candidate = Some(Candidate {
                            target: target.clone(),
                            since: now,
                        });
                        now
                    }
                };

                if now - since >= self.config.hysteresis_ms {
                    self.candidate = None;
                    if let Some(old) = self.armed.take() {
                        events.push(DwellEvent::Cancelled {
                            target_id: old.target.id,
                        });
                    }
                    debug!(target_id = %target.id, "dwell armed");
                    self.armed = Some(Armed {
                        target: target.clone(),
                        phase: ArmPhase::Counting {
                            from: since,
                            fire_at: since + self.config.dwell_ms,
                            repeat: false,
                        },
                    });
                    events.push(DwellEvent::Armed {
                        target_id: target.id.clone(),
                    });
                    self.advance(now, &mut events);
                }
            }
        }

        events
    }

    fn advance(&mut self, now: f64, events: &mut Vec<DwellEvent>) {
        loop {
            let Some(armed) = self.armed.as_mut() else {
                return;
            };

            match armed.phase {
                ArmPhase::Counting {
                    fire_at, repeat, ..
                } if now >= fire_at => {
                    debug!(target_id = %armed.target.id, repeat, "dwell selected");
                    events.push(DwellEvent::Selected {
                        target: armed.target.clone(),
                        repeat,
                    });
                    let next_fire_at = self
                        .config
                        .auto_repeat
                        .then(|| now + self.config.repeat_interval_ms);
                    armed.phase = ArmPhase::Selecting {
                        until: now + self.config.pulse_ms,
                        next_fire_at,
                    };
                    return;
                }
                ArmPhase::Selecting {
                    until,
                    next_fire_at,
                } if now >= until => {
                    armed.phase = match next_fire_at {
                        Some(at) => ArmPhase::Counting {
                            from: at - self.config.repeat_interval_ms,
                            fire_at: at,
                            repeat: true,
                        },
                        None => ArmPhase::Spent,
                    };
                }
                _ => return,
            }
        }
    }

    /// Drop every candidate and armed target. Nothing fires afterwards until
    /// a target is acquired again from scratch.
    pub fn reset(&mut self) {
        self.armed = None;
        self.candidate = None;
    }

    pub fn armed_id(&self) -> Option<&str> {
        self.armed.as_ref().map(|a| a.target.id.as_str())
    }

    pub fn candidate_id(&self) -> Option<&str> {
        self.candidate.as_ref().map(|c| c.target.id.as_str())
    }

    pub fn snapshot(&self, now: f64) -> DwellSnapshot {
        let (phase, progress) = match self.armed.as_ref().map(|a| a.phase) {
            Some(ArmPhase::Counting { from, fire_at, .. }) => {
                let span = fire_at - from;
                let progress = if span > 0.0 {
                    ((now - from) / span).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                (DwellPhase::Armed, progress)
            }
            Some(ArmPhase::Selecting { .. }) => (DwellPhase::Selecting, 1.0),
            // A spent target is hovered but inert until it is lost.
            Some(ArmPhase::Spent) => (DwellPhase::Idle, 0.0),
            None if self.candidate.is_some() => (DwellPhase::Candidate, 0.0),
            None => (DwellPhase::Idle, 0.0),
        };

        DwellSnapshot {
            phase,
            target_id: self.armed_id().map(str::to_string),
            candidate_id: self.candidate_id().map(str::to_string),
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Rect;

    fn key(id: &str) -> InteractiveTarget {
        InteractiveTarget::new(id, Rect::new(0.0, 0.0, 50.0, 50.0), id)
    }

    fn machine(hysteresis_ms: f64, auto_repeat: bool) -> DwellMachine {
        DwellMachine::new(DwellConfig {
            dwell_ms: 500.0,
            hysteresis_ms,
            pulse_ms: 250.0,
            auto_repeat,
            repeat_interval_ms: 900.0,
        })
    }

    /// Feed one resolution per 10ms frame over `[from, to)`.
    fn hold(
        m: &mut DwellMachine,
        from: u32,
        to: u32,
        target: Option<&InteractiveTarget>,
    ) -> Vec<DwellEvent> {
        (from..to)
            .step_by(10)
            .flat_map(|t| m.tick(t as f64, target))
            .collect()
    }

    fn selections(events: &[DwellEvent]) -> Vec<(String, bool)> {
        events
            .iter()
            .filter_map(|e| match e {
                DwellEvent::Selected { target, repeat } => Some((target.id.clone(), *repeat)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn fires_once_for_exactly_the_dwell_time() {
        let a = key("a");
        let mut m = machine(0.0, false);
        let events = hold(&mut m, 0, 510, Some(&a));
        assert_eq!(selections(&events), vec![("a".to_string(), false)]);

        let later = hold(&mut m, 510, 3000, Some(&a));
        assert!(selections(&later).is_empty());
    }

    #[test]
    fn short_hover_never_fires() {
        let a = key("a");
        let mut m = machine(0.0, false);
        let mut events = hold(&mut m, 0, 490, Some(&a));
        events.extend(hold(&mut m, 490, 2000, None));
        assert!(selections(&events).is_empty());
        assert!(events.contains(&DwellEvent::Cancelled {
            target_id: "a".to_string()
        }));
    }

    #[test]
    fn switching_cancels_and_reacquiring_restarts() {
        let (a, b) = (key("a"), key("b"));
        let mut m = machine(70.0, false);

        // 60% of the dwell on A, then B long enough to be promoted.
        let mut events = hold(&mut m, 0, 300, Some(&a));
        events.extend(hold(&mut m, 300, 380, Some(&b)));
        assert_eq!(m.armed_id(), Some("b"));

        // Back to A: timer restarts from when A is seen again (t=380).
        events.extend(hold(&mut m, 380, 870, Some(&a)));
        assert!(selections(&events).is_empty());

        let fired = hold(&mut m, 870, 900, Some(&a));
        assert_eq!(selections(&fired), vec![("a".to_string(), false)]);
    }

    #[test]
    fn single_frame_jitter_does_not_promote_neighbour() {
        let (a, b) = (key("a"), key("b"));
        let mut m = machine(70.0, false);

        let mut events = hold(&mut m, 0, 200, Some(&a));
        events.extend(m.tick(200.0, Some(&b)));
        events.extend(m.tick(210.0, Some(&a)));
        events.extend(m.tick(220.0, Some(&b)));
        events.extend(hold(&mut m, 230, 510, Some(&a)));

        assert!(!events.contains(&DwellEvent::Armed {
            target_id: "b".to_string()
        }));
        assert_eq!(selections(&events), vec![("a".to_string(), false)]);
    }

    #[test]
    fn candidate_waits_for_hysteresis() {
        let a = key("a");
        let mut m = machine(70.0, false);
        m.tick(0.0, Some(&a));
        assert_eq!(m.snapshot(0.0).phase, DwellPhase::Candidate);
        m.tick(60.0, Some(&a));
        assert_eq!(m.armed_id(), None);
        let events = m.tick(70.0, Some(&a));
        assert_eq!(
            events,
            vec![DwellEvent::Armed {
                target_id: "a".to_string()
            }]
        );
        let snap = m.snapshot(250.0);
        assert_eq!(snap.phase, DwellPhase::Armed);
        assert!((snap.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn auto_repeat_fires_at_repeat_interval_while_hovered() {
        let a = key("a");
        let mut m = machine(0.0, true);
        let events = hold(&mut m, 0, 2400, Some(&a));
        assert_eq!(
            selections(&events),
            vec![
                ("a".to_string(), false),
                ("a".to_string(), true),
                ("a".to_string(), true),
            ]
        );

        let after_loss = hold(&mut m, 2400, 5000, None);
        assert!(selections(&after_loss).is_empty());
    }

    #[test]
    fn pulse_is_visible_then_returns_to_armed_with_repeat() {
        let a = key("a");
        let mut m = machine(0.0, true);
        hold(&mut m, 0, 510, Some(&a));
        assert_eq!(m.snapshot(510.0).phase, DwellPhase::Selecting);
        m.tick(760.0, Some(&a));
        assert_eq!(m.snapshot(760.0).phase, DwellPhase::Armed);
    }

    #[test]
    fn spent_target_refires_only_after_loss() {
        let a = key("a");
        let mut m = machine(0.0, false);
        let mut events = hold(&mut m, 0, 1500, Some(&a));
        assert_eq!(m.snapshot(1500.0).phase, DwellPhase::Idle);
        events.extend(m.tick(1500.0, None));
        events.extend(hold(&mut m, 1510, 2020, Some(&a)));
        assert_eq!(selections(&events).len(), 2);
    }

    #[test]
    fn moving_target_keeps_its_timer() {
        let a = key("a");
        let mut moved = key("a");
        moved.rect = Rect::new(10.0, 10.0, 50.0, 50.0);
        let mut m = machine(0.0, false);
        let mut events = hold(&mut m, 0, 300, Some(&a));
        events.extend(hold(&mut m, 300, 510, Some(&moved)));
        assert_eq!(selections(&events).len(), 1);
    }

    #[test]
    fn reset_discards_progress() {
        let a = key("a");
        let mut m = machine(0.0, false);
        hold(&mut m, 0, 450, Some(&a));
        m.reset();
        assert_eq!(m.snapshot(450.0).phase, DwellPhase::Idle);
        let events = hold(&mut m, 450, 900, Some(&a));
        assert!(selections(&events).is_empty());
    }
}
