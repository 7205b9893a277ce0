//! Circuit breaker for downstream protection.
//!
//! # States
//! - Closed: normal operation, calls reach the primary and are observed
//! - Open: dependency assumed down, calls are answered by the fallback
//! - Half-Open: trial calls probe whether the dependency recovered
//!
//! # Call Flow
//! ```text
//! execute(primary, fallback)
//!     → lock: admit (may move Open → Half-Open) → unlock
//!     → run primary or fallback (no lock held)
//!     → lock: record outcome, evaluate transition → unlock
//! ```
//!
//! # Design Decisions
//! - One breaker per guarded dependency, shared via `Arc`
//! - State machine, outcome window and counters sit behind a single mutex
//! - Failure ratio over a bounded window, not cumulative history
//! - The breaker never retries and never times out the primary; callers
//!   wrap the primary with `resilience::timeouts` when they need a deadline
//! - A failed probe is masked by the fallback; a failed closed-state call is not

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::state::{Admission, BreakerState, StateMachine, Transition};
use crate::resilience::stats::{BreakerStats, CallCounters};
use crate::resilience::window::{Outcome, OutcomeKind, OutcomeWindow};

/// Breaker parameters. Immutable once the breaker is built.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failure ratio in (0, 1] that must be exceeded to open the circuit.
    pub failure_threshold: f64,

    /// Number of most recent outcomes considered.
    pub window_size: usize,

    /// Minimum time spent open before probing, in milliseconds.
    pub cooldown_ms: u64,

    /// Successful probes required to close again.
    pub half_open_probes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 0.5,
            window_size: 10,
            cooldown_ms: 3000,
            half_open_probes: 5,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_threshold(mut self, threshold: f64) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown_ms = u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_half_open_probes(mut self, probes: u32) -> Self {
        self.half_open_probes = probes;
        self
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Check every parameter against its domain. Nothing is clamped.
    pub fn validate(&self) -> Result<(), BreakerConfigError> {
        // NaN fails both comparisons, so it is rejected here too.
        if !(self.failure_threshold > 0.0 && self.failure_threshold <= 1.0) {
            return Err(BreakerConfigError::FailureThreshold(self.failure_threshold));
        }
        if self.window_size == 0 {
            return Err(BreakerConfigError::WindowSize);
        }
        if self.half_open_probes == 0 {
            return Err(BreakerConfigError::HalfOpenProbes);
        }
        Ok(())
    }
}

/// Invalid breaker parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BreakerConfigError {
    #[error("failure_threshold must be in (0, 1], got {0}")]
    FailureThreshold(f64),

    #[error("window_size must be positive")]
    WindowSize,

    #[error("half_open_probes must be positive")]
    HalfOpenProbes,
}

/// Error surfaced by [`CircuitBreaker::execute`].
#[derive(Debug, Error)]
pub enum ExecuteError<E> {
    /// The primary failed while the circuit was closed.
    #[error("primary operation failed: {0}")]
    Primary(E),

    /// The fallback failed (circuit open, or after a failed probe).
    #[error("fallback operation failed: {0}")]
    Fallback(E),
}

impl<E> ExecuteError<E> {
    pub fn into_inner(self) -> E {
        match self {
            ExecuteError::Primary(e) | ExecuteError::Fallback(e) => e,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ExecuteError::Fallback(_))
    }
}

#[derive(Debug)]
struct Inner {
    machine: StateMachine,
    window: OutcomeWindow,
    counters: CallCounters,
}

/// Guarded executor for one unreliable operation.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Build a breaker, failing fast on invalid parameters.
    pub fn new(config: CircuitBreakerConfig) -> Result<Self, BreakerConfigError> {
        config.validate()?;
        let inner = Inner {
            machine: StateMachine::new(
                config.failure_threshold,
                config.cooldown(),
                config.half_open_probes,
            ),
            window: OutcomeWindow::new(config.window_size),
            counters: CallCounters::default(),
        };
        Ok(Self {
            name: "default".to_string(),
            config,
            inner: Mutex::new(inner),
        })
    }

    /// Label used in logs, metrics and stats.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        metrics::record_breaker_state(&self.name, BreakerState::Closed);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Run `primary` or `fallback` depending on the circuit state.
    ///
    /// - Closed: the primary's error is returned as [`ExecuteError::Primary`].
    /// - Open: the fallback's result is returned without calling the primary.
    /// - Half-Open: the primary runs as a probe; if it fails, the fallback
    ///   answers this call instead.
    ///
    /// If the returned future is dropped while the primary is running, no
    /// outcome is recorded for it.
    pub async fn execute<T, E, P, PFut, F, FFut>(
        &self,
        primary: P,
        fallback: F,
    ) -> Result<T, ExecuteError<E>>
    where
        P: FnOnce() -> PFut,
        PFut: Future<Output = Result<T, E>>,
        F: FnOnce() -> FFut,
        FFut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let admission = self.admit();

        match admission {
            Admission::ShortCircuit => {
                tracing::debug!(breaker = %self.name, "Circuit open, serving fallback");
                metrics::record_breaker_call(&self.name, "short_circuit");
                fallback().await.map_err(ExecuteError::Fallback)
            }
            Admission::Primary => match primary().await {
                Ok(value) => {
                    self.complete(admission, OutcomeKind::Success);
                    metrics::record_breaker_call(&self.name, "success");
                    Ok(value)
                }
                Err(e) => {
                    self.complete(admission, OutcomeKind::Failure);
                    metrics::record_breaker_call(&self.name, "failure");
                    Err(ExecuteError::Primary(e))
                }
            },
            Admission::Probe { .. } => match primary().await {
                Ok(value) => {
                    self.complete(admission, OutcomeKind::Success);
                    metrics::record_breaker_call(&self.name, "probe_success");
                    Ok(value)
                }
                Err(e) => {
                    self.complete(admission, OutcomeKind::Failure);
                    metrics::record_breaker_call(&self.name, "probe_failure");
                    tracing::warn!(
                        breaker = %self.name,
                        error = %e,
                        "Probe failed, serving fallback"
                    );
                    fallback().await.map_err(ExecuteError::Fallback)
                }
            },
        }
    }

    /// Snapshot of the breaker. Never changes state.
    pub fn stats(&self) -> BreakerStats {
        let inner = self.lock();
        BreakerStats::capture(
            &self.name,
            &inner.machine,
            &inner.window,
            &inner.counters,
            Instant::now(),
        )
    }

    /// Current state as last recorded. An expired cooldown is only acted on
    /// by the next `execute`.
    pub fn state(&self) -> BreakerState {
        self.lock().machine.state()
    }

    fn admit(&self) -> Admission {
        let (admission, transition) = {
            let mut inner = self.lock();
            inner.counters.total_calls += 1;
            let (admission, transition) = inner.machine.admit(Instant::now());
            if admission == Admission::ShortCircuit {
                inner.counters.short_circuited += 1;
            }
            (admission, transition)
        };

        if let Some(transition) = transition {
            self.on_transition(transition);
        }
        admission
    }

    fn complete(&self, admission: Admission, kind: OutcomeKind) {
        let transition = {
            let mut inner = self.lock();
            let now = Instant::now();
            if kind == OutcomeKind::Failure {
                inner.counters.total_failures += 1;
            }
            let Inner { machine, window, .. } = &mut *inner;
            window.record(Outcome::new(kind, now));
            machine.on_outcome(admission, kind, window, now)
        };

        if let Some(transition) = transition {
            self.on_transition(transition);
        }
    }

    fn on_transition(&self, transition: Transition) {
        match transition.to {
            BreakerState::Open => tracing::warn!(
                breaker = %self.name,
                from = %transition.from,
                cooldown_ms = self.config.cooldown_ms,
                "Circuit opened"
            ),
            BreakerState::HalfOpen => tracing::info!(
                breaker = %self.name,
                probes_required = self.config.half_open_probes,
                "Circuit half-open, probing"
            ),
            BreakerState::Closed => tracing::info!(
                breaker = %self.name,
                "Circuit closed"
            ),
        }
        metrics::record_breaker_transition(&self.name, transition);
    }

    // Bookkeeping never panics mid-update, so a poisoned guard still holds
    // consistent data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
