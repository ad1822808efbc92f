//! Incident state machine with trigger persistence and end grace hysteresis.

use contracts::{IncidentAction, IncidentConfig, IncidentState};
use tracing::{debug, info};

/// Internal phase; timestamps live inside the variant that owns them
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Triggering {
        first_signal_time: f64,
    },
    Recording {
        first_signal_time: f64,
        record_start_time: f64,
    },
}

/// Debounced Idle / Triggering / Recording decision maker
///
/// Fed one `(signal, now)` pair per frame. Emits `Start` exactly once per
/// Triggering -> Recording transition and `Stop` exactly once per
/// Recording -> Idle transition.
///
/// While not recording, a false frame does not break the streak on its own;
/// the streak is abandoned only once `end_seconds` have passed since it began.
/// While recording, every true frame moves `first_signal_time` to `now`, so
/// the grace window counts from the last positive frame.
#[derive(Debug, Clone)]
pub struct IncidentStateMachine {
    trigger_seconds: f64,
    end_seconds: f64,
    phase: Phase,
    transitions: u64,
}

impl IncidentStateMachine {
    pub fn new(config: &IncidentConfig) -> Self {
        Self::with_thresholds(config.trigger_seconds, config.end_seconds)
    }

    pub fn with_thresholds(trigger_seconds: f64, end_seconds: f64) -> Self {
        Self {
            trigger_seconds,
            end_seconds,
            phase: Phase::Idle,
            transitions: 0,
        }
    }

    /// Feed one frame's signal
    pub fn update(&mut self, signal: bool, now: f64) -> Option<IncidentAction> {
        if signal {
            self.on_present(now)
        } else {
            self.on_absent(now)
        }
    }

    fn on_present(&mut self, now: f64) -> Option<IncidentAction> {
        match self.phase {
            Phase::Idle => {
                self.set_phase(Phase::Triggering {
                    first_signal_time: now,
                });
                self.try_start(now, now)
            }
            Phase::Triggering { first_signal_time } => self.try_start(first_signal_time, now),
            Phase::Recording {
                record_start_time, ..
            } => {
                self.phase = Phase::Recording {
                    first_signal_time: now,
                    record_start_time,
                };
                None
            }
        }
    }

    fn try_start(&mut self, first_signal_time: f64, now: f64) -> Option<IncidentAction> {
        if now - first_signal_time > self.trigger_seconds {
            info!(
                first_signal_time,
                at = now,
                persisted_s = now - first_signal_time,
                "Incident confirmed, recording"
            );
            self.set_phase(Phase::Recording {
                first_signal_time,
                record_start_time: now,
            });
            Some(IncidentAction::Start { at: now })
        } else {
            None
        }
    }

    fn on_absent(&mut self, now: f64) -> Option<IncidentAction> {
        match self.phase {
            Phase::Idle => None,
            Phase::Triggering { first_signal_time } => {
                if now - first_signal_time > self.end_seconds {
                    debug!(first_signal_time, at = now, "Presence streak abandoned");
                    self.set_phase(Phase::Idle);
                }
                None
            }
            Phase::Recording {
                first_signal_time,
                record_start_time,
            } => {
                if now - first_signal_time > self.end_seconds {
                    info!(
                        record_start_time,
                        at = now,
                        quiet_s = now - first_signal_time,
                        "Incident over, stopping recording"
                    );
                    self.set_phase(Phase::Idle);
                    Some(IncidentAction::Stop { at: now })
                } else {
                    None
                }
            }
        }
    }

    /// Leave Recording unconditionally (shutdown path)
    pub fn force_stop(&mut self, now: f64) -> Option<IncidentAction> {
        match self.phase {
            Phase::Recording { .. } => {
                self.set_phase(Phase::Idle);
                Some(IncidentAction::Stop { at: now })
            }
            Phase::Triggering { .. } => {
                self.set_phase(Phase::Idle);
                None
            }
            Phase::Idle => None,
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.transitions += 1;
    }

    pub fn state(&self) -> IncidentState {
        match self.phase {
            Phase::Idle => IncidentState::Idle,
            Phase::Triggering { .. } => IncidentState::Triggering,
            Phase::Recording { .. } => IncidentState::Recording,
        }
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        matches!(self.phase, Phase::Recording { .. })
    }

    pub fn first_signal_time(&self) -> Option<f64> {
        match self.phase {
            Phase::Idle => None,
            Phase::Triggering { first_signal_time }
            | Phase::Recording {
                first_signal_time, ..
            } => Some(first_signal_time),
        }
    }

    pub fn record_start_time(&self) -> Option<f64> {
        match self.phase {
            Phase::Recording {
                record_start_time, ..
            } => Some(record_start_time),
            _ => None,
        }
    }

    /// Number of state changes so far
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: bool = true;
    const F: bool = false;

    /// Feed signals at 1 frame/sec, returning (index, action) pairs
    fn run(machine: &mut IncidentStateMachine, signals: &[bool]) -> Vec<(usize, IncidentAction)> {
        signals
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| machine.update(s, i as f64).map(|a| (i, a)))
            .collect()
    }

    #[test]
    fn test_all_false_never_transitions() {
        let mut machine = IncidentStateMachine::with_thresholds(2.0, 20.0);
        assert!(run(&mut machine, &[F; 100]).is_empty());
        assert_eq!(machine.state(), IncidentState::Idle);
        assert_eq!(machine.first_signal_time(), None);
        assert_eq!(machine.transitions(), 0);
    }

    #[test]
    fn test_gap_tolerated_while_triggering() {
        let mut machine = IncidentStateMachine::with_thresholds(2.0, 20.0);
        let actions = run(&mut machine, &[F, F, T, T, T, F, T, T, T, T, T]);

        assert_eq!(actions, vec![(6, IncidentAction::Start { at: 6.0 })]);
        assert!(machine.is_recording());
        assert_eq!(machine.record_start_time(), Some(6.0));
    }

    #[test]
    fn test_persistence_must_exceed_threshold() {
        let mut machine = IncidentStateMachine::with_thresholds(2.0, 20.0);
        // t=0..2: exactly 2s elapsed, not more
        assert!(run(&mut machine, &[T, T, T]).is_empty());
        assert_eq!(machine.state(), IncidentState::Triggering);
        assert_eq!(machine.first_signal_time(), Some(0.0));
        assert_eq!(machine.update(T, 2.5), Some(IncidentAction::Start { at: 2.5 }));
    }

    #[test]
    fn test_first_signal_time_kept_on_start() {
        let mut machine = IncidentStateMachine::with_thresholds(1.0, 5.0);
        machine.update(T, 10.0);
        assert_eq!(
            machine.update(T, 11.5),
            Some(IncidentAction::Start { at: 11.5 })
        );
        assert_eq!(machine.first_signal_time(), Some(10.0));
    }

    #[test]
    fn test_triggering_streak_abandoned_after_end_seconds() {
        let mut machine = IncidentStateMachine::with_thresholds(2.0, 5.0);
        machine.update(T, 0.0);
        assert_eq!(machine.update(F, 5.0), None);
        assert_eq!(machine.state(), IncidentState::Triggering);
        assert_eq!(machine.update(F, 5.1), None);
        assert_eq!(machine.state(), IncidentState::Idle);
        assert_eq!(machine.first_signal_time(), None);

        // A fresh streak starts from its own first frame
        machine.update(T, 6.0);
        assert_eq!(machine.first_signal_time(), Some(6.0));
    }

    #[test]
    fn test_grace_timer_reset_by_single_true_frame() {
        let mut machine = IncidentStateMachine::with_thresholds(2.0, 20.0);
        machine.update(T, 0.0);
        assert_eq!(machine.update(T, 3.0), Some(IncidentAction::Start { at: 3.0 }));
        machine.update(T, 4.0);
        assert_eq!(machine.first_signal_time(), Some(4.0));

        // False for END_SECONDS - 1 after the last positive frame
        for t in 5..=23 {
            assert_eq!(machine.update(F, t as f64), None);
        }
        assert_eq!(machine.update(T, 24.0), None);
        assert!(machine.is_recording());
        assert_eq!(machine.first_signal_time(), Some(24.0));

        // Would have stopped at t=25 without the reset
        assert_eq!(machine.update(F, 25.0), None);
        assert_eq!(machine.update(F, 44.0), None);
        assert_eq!(
            machine.update(F, 44.5),
            Some(IncidentAction::Stop { at: 44.5 })
        );
        assert_eq!(machine.state(), IncidentState::Idle);
        assert_eq!(machine.first_signal_time(), None);
        assert_eq!(machine.record_start_time(), None);
    }

    #[test]
    fn test_one_start_and_one_stop_per_incident() {
        let mut machine = IncidentStateMachine::with_thresholds(1.0, 3.0);
        let mut signals = vec![T; 10];
        signals.extend([F; 10]);
        signals.extend([T; 10]);
        signals.extend([F; 10]);

        let actions = run(&mut machine, &signals);
        let starts = actions
            .iter()
            .filter(|(_, a)| matches!(a, IncidentAction::Start { .. }))
            .count();
        let stops = actions
            .iter()
            .filter(|(_, a)| matches!(a, IncidentAction::Stop { .. }))
            .count();
        assert_eq!(starts, 2);
        assert_eq!(stops, 2);

        // Starts and stops strictly alternate
        for pair in actions.windows(2) {
            assert_ne!(
                std::mem::discriminant(&pair[0].1),
                std::mem::discriminant(&pair[1].1)
            );
        }
    }

    #[test]
    fn test_force_stop() {
        let mut machine = IncidentStateMachine::with_thresholds(0.5, 10.0);
        assert_eq!(machine.force_stop(0.0), None);

        machine.update(T, 0.0);
        machine.update(T, 1.0);
        assert_eq!(
            machine.force_stop(1.5),
            Some(IncidentAction::Stop { at: 1.5 })
        );
        assert_eq!(machine.state(), IncidentState::Idle);
        assert_eq!(machine.force_stop(2.0), None);
    }
}
