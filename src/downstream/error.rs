//! Downstream error definitions.

use std::fmt;
use thiserror::Error;

/// The downstream services the aggregator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Flights,
    Hotels,
    Weather,
    Events,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Flights => "flights",
            Service::Hotels => "hotels",
            Service::Weather => "weather",
            Service::Events => "events",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while calling a downstream service.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// Connection or transport failure.
    #[error("{service} service request failed: {source}")]
    Request {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} service returned status {status}")]
    Status { service: Service, status: u16 },

    /// The response body did not match the expected shape.
    #[error("{service} service returned an unreadable body: {source}")]
    Decode {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    /// No answer within the deadline.
    #[error("{service} service timed out after {after_ms} ms")]
    Timeout { service: Service, after_ms: u64 },

    /// The request URL could not be built.
    #[error("{service} service URL is invalid: {source}")]
    Url {
        service: Service,
        #[source]
        source: url::ParseError,
    },
}

impl DownstreamError {
    pub fn service(&self) -> Service {
        match self {
            DownstreamError::Request { service, .. }
            | DownstreamError::Status { service, .. }
            | DownstreamError::Decode { service, .. }
            | DownstreamError::Timeout { service, .. }
            | DownstreamError::Url { service, .. } => *service,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DownstreamError::Timeout { .. })
    }
}
