//! Error responses.
//!
//! # Responsibilities
//! - Map validation and downstream errors to HTTP status codes
//! - Render a uniform JSON error body
//!
//! # Design Decisions
//! - Validation failures list every message
//! - Downstream timeouts result in 504 Gateway Timeout, other downstream
//!   failures in 502 Bad Gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::aggregator::AggregatorError;
use crate::downstream::DownstreamError;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid query: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Aggregator(#[from] AggregatorError),
}

/// JSON error body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: Vec<String>,
    pub error: &'static str,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Aggregator(AggregatorError::NoFlights { .. }) => StatusCode::NOT_FOUND,
            AppError::Aggregator(AggregatorError::Downstream(e)) => match e {
                DownstreamError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Validation(messages) => messages,
            AppError::Aggregator(e) => vec![e.to_string()],
        };
        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
            error: status.canonical_reason().unwrap_or("Error"),
        };
        (status, Json(body)).into_response()
    }
}
