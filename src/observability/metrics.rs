//! Metrics collection and exposition.
//!
//! # Metrics
//! - `aggregator_requests_total` (counter): requests by route, status
//! - `aggregator_request_duration_seconds` (histogram): handler latency
//! - `aggregator_api_version_total` (counter): v1/v2 trip searches
//! - `aggregator_downstream_requests_total` (counter): calls by service, outcome
//! - `aggregator_downstream_duration_seconds` (histogram): downstream latency
//! - `circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `circuit_breaker_transitions_total` (counter): by breaker, from, to
//! - `circuit_breaker_calls_total` (counter): by breaker, result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which keeps tests silent
//! - Prometheus exposition runs on its own listener

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::state::{BreakerState, Transition};

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a handled request.
pub fn record_request(route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "aggregator_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("aggregator_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a trip search against an API version.
pub fn record_api_version(version: &'static str) {
    metrics::counter!("aggregator_api_version_total", "version" => version).increment(1);
}

/// Record a downstream call.
pub fn record_downstream(service: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "aggregator_downstream_requests_total",
        "service" => service,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("aggregator_downstream_duration_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());
}

/// Publish the current state of a breaker.
pub fn record_breaker_state(breaker: &str, state: BreakerState) {
    metrics::gauge!("circuit_breaker_state", "breaker" => breaker.to_string())
        .set(state.as_gauge());
}

/// Record a breaker transition and its resulting state.
pub fn record_breaker_transition(breaker: &str, transition: Transition) {
    metrics::counter!(
        "circuit_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => transition.from.as_str(),
        "to" => transition.to.as_str()
    )
    .increment(1);
    record_breaker_state(breaker, transition.to);
}

/// Record how a guarded call was resolved.
pub fn record_breaker_call(breaker: &str, result: &'static str) {
    metrics::counter!(
        "circuit_breaker_calls_total",
        "breaker" => breaker.to_string(),
        "result" => result
    )
    .increment(1);
}
