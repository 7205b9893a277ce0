//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to an unreliable dependency:
//!     → circuit_breaker.rs (admit: primary, probe or fallback)
//!     → timeouts.rs (caller-side deadline; expiry counts as a failure)
//!     → window.rs (record outcome, compute failure ratio)
//!     → state.rs (evaluate transition)
//!     → stats.rs (read-only snapshot for /metrics)
//! ```
//!
//! # Design Decisions
//! - Breakers are explicit instances handed to collaborators, never globals
//! - Timeouts live outside the breaker so the two policies stay orthogonal
//! - No automatic retries: the breaker only decides whether to call

pub mod circuit_breaker;
pub mod state;
pub mod stats;
pub mod timeouts;
pub mod window;

pub use circuit_breaker::{BreakerConfigError, CircuitBreaker, CircuitBreakerConfig, ExecuteError};
pub use state::BreakerState;
pub use stats::BreakerStats;
