//! Trip search aggregator.
//!
//! Fans trip searches out to flights, hotels, weather and events services,
//! serves v1 and v2 of the search API side by side, and guards the weather
//! dependency with a circuit breaker from [`resilience`].

pub mod aggregator;
pub mod config;
pub mod downstream;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::AggregatorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{CircuitBreaker, CircuitBreakerConfig};
