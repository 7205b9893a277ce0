//! Trip aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! Validated query (query.rs)
//!     → service.rs (fan out to downstream clients)
//!         → v2 only: weather via resilience::CircuitBreaker
//!     → combined response
//!
//! usage.rs counts v1/v2 searches for the migration report
//! ```

pub mod query;
pub mod service;
pub mod usage;

pub use query::{TripQuery, TripQueryParams};
pub use service::{AggregatorError, AggregatorService};
pub use usage::{ApiVersion, VersionUsage};
