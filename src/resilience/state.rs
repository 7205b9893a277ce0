//! Circuit breaker state machine.
//!
//! # State Transitions
//! ```text
//! Closed    → Open:      failure ratio > threshold after a recorded outcome
//! Open      → Half-Open: cooldown elapsed (checked lazily on admission)
//! Half-Open → Closed:    `half_open_probes` successful probes; window cleared
//! Half-Open → Open:      any probe fails; cooldown restarts
//! ```
//!
//! # Design Decisions
//! - The machine is plain data; the breaker serializes access with a mutex
//! - Every transition bumps an epoch, so a probe admitted in one half-open
//!   episode cannot advance or reopen a later one
//! - Transitions are returned to the caller, which logs them outside the lock

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::resilience::window::{OutcomeKind, OutcomeWindow};

/// Current breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    /// Calls pass through to the primary operation.
    Closed,
    /// Calls are shunted to the fallback.
    Open,
    /// Trial calls probe the primary for recovery.
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "CLOSED",
            BreakerState::Open => "OPEN",
            BreakerState::HalfOpen => "HALF_OPEN",
        }
    }

    /// Gauge value exported for this state.
    pub fn as_gauge(&self) -> f64 {
        match self {
            BreakerState::Closed => 0.0,
            BreakerState::Open => 1.0,
            BreakerState::HalfOpen => 2.0,
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a call was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Closed: run the primary and observe it.
    Primary,
    /// Half-open: run the primary as a probe for the given episode.
    Probe { epoch: u64 },
    /// Open: skip the primary entirely.
    ShortCircuit,
}

/// A state change, reported back to the caller for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BreakerState,
    pub to: BreakerState,
}

/// State, timestamps and probe counters of one breaker.
#[derive(Debug)]
pub struct StateMachine {
    state: BreakerState,
    opened_at: Option<Instant>,
    probes_succeeded: u32,
    epoch: u64,
    failure_threshold: f64,
    cooldown: Duration,
    half_open_probes: u32,
}

impl StateMachine {
    pub fn new(failure_threshold: f64, cooldown: Duration, half_open_probes: u32) -> Self {
        Self {
            state: BreakerState::Closed,
            opened_at: None,
            probes_succeeded: 0,
            epoch: 0,
            failure_threshold,
            cooldown,
            half_open_probes,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn opened_at(&self) -> Option<Instant> {
        self.opened_at
    }

    pub fn probes_succeeded(&self) -> u32 {
        self.probes_succeeded
    }

    pub fn half_open_probes(&self) -> u32 {
        self.half_open_probes
    }

    /// Time left before an open breaker admits a probe. Zero once elapsed,
    /// `None` unless open.
    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        match (self.state, self.opened_at) {
            (BreakerState::Open, Some(opened_at)) => {
                let elapsed = now.saturating_duration_since(opened_at);
                Some(self.cooldown.saturating_sub(elapsed))
            }
            _ => None,
        }
    }

    /// Decide how a new call is handled, moving Open → Half-Open when the
    /// cooldown has run out.
    pub fn admit(&mut self, now: Instant) -> (Admission, Option<Transition>) {
        let mut transition = None;
        if self.state == BreakerState::Open && self.cooldown_remaining(now) == Some(Duration::ZERO) {
            self.probes_succeeded = 0;
            transition = Some(self.transition_to(BreakerState::HalfOpen));
        }

        let admission = match self.state {
            BreakerState::Closed => Admission::Primary,
            BreakerState::Open => Admission::ShortCircuit,
            BreakerState::HalfOpen => Admission::Probe { epoch: self.epoch },
        };
        (admission, transition)
    }

    /// Evaluate transitions after `kind` has been recorded into `window`.
    pub fn on_outcome(
        &mut self,
        admission: Admission,
        kind: OutcomeKind,
        window: &mut OutcomeWindow,
        now: Instant,
    ) -> Option<Transition> {
        match self.state {
            BreakerState::Closed => {
                if kind == OutcomeKind::Failure && window.failure_ratio() > self.failure_threshold {
                    self.opened_at = Some(now);
                    return Some(self.transition_to(BreakerState::Open));
                }
                None
            }
            BreakerState::HalfOpen => {
                let Admission::Probe { epoch } = admission else {
                    return None;
                };
                if epoch != self.epoch {
                    return None;
                }
                match kind {
                    OutcomeKind::Success => {
                        self.probes_succeeded += 1;
                        if self.probes_succeeded >= self.half_open_probes {
                            window.clear();
                            self.opened_at = None;
                            self.probes_succeeded = 0;
                            Some(self.transition_to(BreakerState::Closed))
                        } else {
                            None
                        }
                    }
                    OutcomeKind::Failure => {
                        self.opened_at = Some(now);
                        self.probes_succeeded = 0;
                        Some(self.transition_to(BreakerState::Open))
                    }
                }
            }
            BreakerState::Open => None,
        }
    }

    fn transition_to(&mut self, to: BreakerState) -> Transition {
        let from = self.state;
        self.state = to;
        self.epoch = self.epoch.wrapping_add(1);
        Transition { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::window::Outcome;

    fn record(
        machine: &mut StateMachine,
        window: &mut OutcomeWindow,
        admission: Admission,
        kind: OutcomeKind,
        now: Instant,
    ) -> Option<Transition> {
        window.record(Outcome::new(kind, now));
        machine.on_outcome(admission, kind, window, now)
    }

    #[test]
    fn test_initial_state_is_closed() {
        let mut machine = StateMachine::new(0.5, Duration::from_secs(3), 2);
        assert_eq!(machine.state(), BreakerState::Closed);
        assert!(machine.opened_at().is_none());
        let (admission, transition) = machine.admit(Instant::now());
        assert_eq!(admission, Admission::Primary);
        assert!(transition.is_none());
    }

    #[test]
    fn test_ratio_at_threshold_does_not_open() {
        let mut machine = StateMachine::new(0.5, Duration::from_secs(3), 2);
        let mut window = OutcomeWindow::new(4);
        let now = Instant::now();
        record(&mut machine, &mut window, Admission::Primary, OutcomeKind::Success, now);
        let t = record(&mut machine, &mut window, Admission::Primary, OutcomeKind::Failure, now);
        assert!(t.is_none());
        assert_eq!(machine.state(), BreakerState::Closed);

        let t = record(&mut machine, &mut window, Admission::Primary, OutcomeKind::Failure, now);
        assert_eq!(
            t,
            Some(Transition { from: BreakerState::Closed, to: BreakerState::Open })
        );
        assert_eq!(machine.opened_at(), Some(now));
    }

    #[test]
    fn test_cooldown_moves_open_to_half_open() {
        let mut machine = StateMachine::new(0.5, Duration::from_millis(100), 2);
        let mut window = OutcomeWindow::new(4);
        let t0 = Instant::now();
        record(&mut machine, &mut window, Admission::Primary, OutcomeKind::Failure, t0);
        assert_eq!(machine.state(), BreakerState::Open);

        let (admission, transition) = machine.admit(t0 + Duration::from_millis(99));
        assert_eq!(admission, Admission::ShortCircuit);
        assert!(transition.is_none());
        assert_eq!(
            machine.cooldown_remaining(t0 + Duration::from_millis(99)),
            Some(Duration::from_millis(1))
        );

        let (admission, transition) = machine.admit(t0 + Duration::from_millis(100));
        assert!(matches!(admission, Admission::Probe { .. }));
        assert_eq!(transition.map(|t| t.to), Some(BreakerState::HalfOpen));
        assert!(machine.cooldown_remaining(t0).is_none());
    }

    #[test]
    fn test_probes_close_and_clear_window() {
        let mut machine = StateMachine::new(0.5, Duration::ZERO, 2);
        let mut window = OutcomeWindow::new(4);
        let now = Instant::now();
        record(&mut machine, &mut window, Admission::Primary, OutcomeKind::Failure, now);

        let (probe, _) = machine.admit(now);
        let t = record(&mut machine, &mut window, probe, OutcomeKind::Success, now);
        assert!(t.is_none());
        assert_eq!(machine.probes_succeeded(), 1);

        let t = record(&mut machine, &mut window, probe, OutcomeKind::Success, now);
        assert_eq!(t.map(|t| t.to), Some(BreakerState::Closed));
        assert!(window.is_empty());
        assert_eq!(machine.probes_succeeded(), 0);
    }

    #[test]
    fn test_probe_failure_reopens() {
        let mut machine = StateMachine::new(0.5, Duration::ZERO, 3);
        let mut window = OutcomeWindow::new(4);
        let t0 = Instant::now();
        record(&mut machine, &mut window, Admission::Primary, OutcomeKind::Failure, t0);

        let (probe, _) = machine.admit(t0);
        record(&mut machine, &mut window, probe, OutcomeKind::Success, t0);
        record(&mut machine, &mut window, probe, OutcomeKind::Success, t0);

        let t1 = t0 + Duration::from_millis(5);
        let t = record(&mut machine, &mut window, probe, OutcomeKind::Failure, t1);
        assert_eq!(t.map(|t| t.to), Some(BreakerState::Open));
        assert_eq!(machine.opened_at(), Some(t1));
        assert_eq!(machine.probes_succeeded(), 0);
    }

    #[test]
    fn test_stale_probe_is_ignored() {
        let mut machine = StateMachine::new(0.5, Duration::ZERO, 2);
        let mut window = OutcomeWindow::new(4);
        let now = Instant::now();
        record(&mut machine, &mut window, Admission::Primary, OutcomeKind::Failure, now);

        let (stale, _) = machine.admit(now);
        record(&mut machine, &mut window, stale, OutcomeKind::Failure, now);
        assert_eq!(machine.state(), BreakerState::Open);

        let (fresh, _) = machine.admit(now);
        assert_ne!(stale, fresh);
        let t = record(&mut machine, &mut window, stale, OutcomeKind::Failure, now);
        assert!(t.is_none());
        assert_eq!(machine.state(), BreakerState::HalfOpen);
    }

    #[test]
    fn test_state_serializes_screaming_case() {
        let json = serde_json::to_string(&BreakerState::HalfOpen).unwrap();
        assert_eq!(json, "\"HALF_OPEN\"");
        assert_eq!(BreakerState::Open.to_string(), "OPEN");
    }
}
