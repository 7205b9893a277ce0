//! Sliding window of recent call outcomes.
//!
//! # Responsibilities
//! - Retain the last `capacity` outcomes of one guarded operation
//! - Evict the oldest outcome once the window is full
//! - Report the failure ratio over what is currently retained
//!
//! # Design Decisions
//! - Ring buffer (`VecDeque`) with a running failure count, so both
//!   `record` and `failure_ratio` are O(1)
//! - An empty window reports a ratio of 0.0 (no data never trips a breaker)
//! - No minimum-sample gate: one failure in an otherwise empty window is a
//!   ratio of 1.0

use std::collections::VecDeque;
use tokio::time::Instant;

/// Whether a guarded call succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// A single recorded call outcome.
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub recorded_at: Instant,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, recorded_at: Instant) -> Self {
        Self { kind, recorded_at }
    }

    #[cfg(test)]
    pub fn success() -> Self {
        Self::new(OutcomeKind::Success, Instant::now())
    }

    #[cfg(test)]
    pub fn failure() -> Self {
        Self::new(OutcomeKind::Failure, Instant::now())
    }

    pub fn is_failure(&self) -> bool {
        self.kind == OutcomeKind::Failure
    }
}

/// Fixed-capacity, time-ordered record of recent outcomes.
#[derive(Debug)]
pub struct OutcomeWindow {
    outcomes: VecDeque<Outcome>,
    capacity: usize,
    failures: usize,
}

impl OutcomeWindow {
    /// Create an empty window. `capacity` must be positive; the breaker
    /// validates this before a window is ever built.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "outcome window capacity must be positive");
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    /// Append an outcome, returning the evicted one if the window overflowed.
    pub fn record(&mut self, outcome: Outcome) -> Option<Outcome> {
        if outcome.is_failure() {
            self.failures += 1;
        }
        self.outcomes.push_back(outcome);

        if self.outcomes.len() > self.capacity {
            let evicted = self.outcomes.pop_front();
            if let Some(old) = &evicted {
                if old.is_failure() {
                    self.failures -= 1;
                }
            }
            evicted
        } else {
            None
        }
    }

    /// Failures divided by retained outcomes, or 0.0 when empty.
    pub fn failure_ratio(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.failures as f64 / self.outcomes.len() as f64
    }

    /// Number of outcomes currently retained.
    pub fn size(&self) -> usize {
        self.outcomes.len()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of failures currently retained.
    #[cfg(test)]
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Drop every retained outcome.
    pub fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(window: &mut OutcomeWindow, pattern: &str) {
        for c in pattern.chars() {
            match c {
                'F' => window.record(Outcome::failure()),
                _ => window.record(Outcome::success()),
            };
        }
    }

    #[test]
    fn test_empty_window_ratio_is_zero() {
        let window = OutcomeWindow::new(5);
        assert_eq!(window.size(), 0);
        assert_eq!(window.failure_ratio(), 0.0);
        assert!(window.is_empty());
    }

    #[test]
    fn test_ratio_below_full_capacity() {
        let mut window = OutcomeWindow::new(10);
        fill(&mut window, "SF");
        assert_eq!(window.size(), 2);
        assert_eq!(window.failure_ratio(), 0.5);

        let mut single = OutcomeWindow::new(10);
        fill(&mut single, "F");
        assert_eq!(single.failure_ratio(), 1.0);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut window = OutcomeWindow::new(3);
        for i in 0..50 {
            if i % 3 == 0 {
                window.record(Outcome::failure());
            } else {
                window.record(Outcome::success());
            }
            assert!(window.size() <= 3);
        }
        assert_eq!(window.size(), 3);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut window = OutcomeWindow::new(4);
        fill(&mut window, "FFSS");
        assert_eq!(window.failures(), 2);

        let evicted = window.record(Outcome::success());
        assert_eq!(evicted.map(|o| o.kind), Some(OutcomeKind::Failure));
        assert_eq!(window.failures(), 1);
        assert_eq!(window.failure_ratio(), 0.25);

        let evicted = window.record(Outcome::success());
        assert_eq!(evicted.map(|o| o.kind), Some(OutcomeKind::Failure));
        assert_eq!(window.failures(), 0);
        assert_eq!(window.failure_ratio(), 0.0);
    }

    #[test]
    fn test_clear_resets_counts() {
        let mut window = OutcomeWindow::new(4);
        fill(&mut window, "FFF");
        window.clear();
        assert_eq!(window.size(), 0);
        assert_eq!(window.failures(), 0);
        assert_eq!(window.failure_ratio(), 0.0);
        assert_eq!(window.capacity(), 4);
    }
}
