//! Read-only breaker snapshots.

use serde::Serialize;
use tokio::time::Instant;

use crate::resilience::state::{BreakerState, StateMachine};
use crate::resilience::window::OutcomeWindow;

/// Point-in-time view of a breaker, serialized verbatim by `/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStats {
    pub name: String,
    pub state: BreakerState,
    /// Every `execute` call, including short-circuited ones.
    pub total_calls: u64,
    /// Primary failures, probes included.
    pub total_failures: u64,
    /// Calls answered by the fallback without touching the primary.
    pub short_circuited: u64,
    pub failure_ratio: f64,
    /// Outcomes currently retained, at most the configured window size.
    pub window_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes_completed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probes_required: Option<u32>,
}

/// Running totals kept alongside the state machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallCounters {
    pub total_calls: u64,
    pub total_failures: u64,
    pub short_circuited: u64,
}

impl BreakerStats {
    /// Build a snapshot from live breaker state. Reads only.
    pub(crate) fn capture(
        name: &str,
        machine: &StateMachine,
        window: &OutcomeWindow,
        counters: &CallCounters,
        now: Instant,
    ) -> Self {
        let state = machine.state();
        let half_open = state == BreakerState::HalfOpen;
        Self {
            name: name.to_string(),
            state,
            total_calls: counters.total_calls,
            total_failures: counters.total_failures,
            short_circuited: counters.short_circuited,
            failure_ratio: window.failure_ratio(),
            window_length: window.size(),
            cooldown_remaining_ms: machine
                .cooldown_remaining(now)
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            probes_completed: half_open.then(|| machine.probes_succeeded()),
            probes_required: half_open.then(|| machine.half_open_probes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::state::Admission;
    use crate::resilience::window::{Outcome, OutcomeKind};
    use std::time::Duration;

    #[test]
    fn test_closed_snapshot_omits_optional_fields() {
        let machine = StateMachine::new(0.5, Duration::from_secs(3), 5);
        let window = OutcomeWindow::new(10);
        let stats = BreakerStats::capture(
            "weather",
            &machine,
            &window,
            &CallCounters::default(),
            Instant::now(),
        );

        assert_eq!(stats.state, BreakerState::Closed);
        assert_eq!(stats.failure_ratio, 0.0);
        assert!(stats.cooldown_remaining_ms.is_none());
        assert!(stats.probes_completed.is_none());

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["state"], "CLOSED");
        assert_eq!(json["totalCalls"], 0);
        assert!(json.get("cooldownRemainingMs").is_none());
        assert!(json.get("probesCompleted").is_none());
    }

    #[test]
    fn test_open_snapshot_reports_cooldown() {
        let mut machine = StateMachine::new(0.5, Duration::from_secs(3), 5);
        let mut window = OutcomeWindow::new(10);
        let t0 = Instant::now();
        window.record(Outcome::new(OutcomeKind::Failure, t0));
        machine.on_outcome(Admission::Primary, OutcomeKind::Failure, &mut window, t0);

        let counters = CallCounters {
            total_calls: 1,
            total_failures: 1,
            short_circuited: 0,
        };
        let stats = BreakerStats::capture(
            "weather",
            &machine,
            &window,
            &counters,
            t0 + Duration::from_millis(1000),
        );

        assert_eq!(stats.state, BreakerState::Open);
        assert_eq!(stats.cooldown_remaining_ms, Some(2000));
        assert_eq!(stats.failure_ratio, 1.0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["cooldownRemainingMs"], 2000);
        assert_eq!(json["totalFailures"], 1);
    }
}
