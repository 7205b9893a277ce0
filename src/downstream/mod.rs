//! Downstream service clients.
//!
//! # Data Flow
//! ```text
//! Aggregator service
//!     → client.rs (build URL, send, bound by timeout)
//!     → flights / hotels / weather / events endpoints
//!     → types.rs (decode response payloads)
//! ```
//!
//! # Design Decisions
//! - One shared `reqwest::Client` (connection pooling across services)
//! - Payloads are decoded into typed envelopes, unknown fields preserved
//! - Every failure mode maps to a `DownstreamError` naming the service

pub mod client;
pub mod error;
pub mod types;

pub use client::DownstreamClient;
pub use error::{DownstreamError, Service};
pub use types::{
    EventsResponse, Flight, FlightsResponse, HotelsResponse, WeatherReport,
};
