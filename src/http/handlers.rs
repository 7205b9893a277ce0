//! Route handlers.
//!
//! Handlers only validate, count and delegate; the aggregator service does
//! the fan-out.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::aggregator::service::{
    CheapestRouteResponse, ContextualResponse, TripSearchResponse, TripSearchV2Response,
};
use crate::aggregator::usage::UsageReport;
use crate::aggregator::{ApiVersion, TripQueryParams};
use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::resilience::BreakerStats;

/// Body of `GET /metrics`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub usage: UsageReport,
    pub circuit_breaker: BreakerStats,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn search_trips_v1(
    State(state): State<AppState>,
    Query(params): Query<TripQueryParams>,
) -> Result<Json<TripSearchResponse>, AppError> {
    let query = params.validate().map_err(AppError::Validation)?;
    state.usage.record(ApiVersion::V1);
    Ok(Json(state.service.search_trips_v1(&query).await?))
}

pub async fn cheapest_route(
    State(state): State<AppState>,
    Query(params): Query<TripQueryParams>,
) -> Result<Json<CheapestRouteResponse>, AppError> {
    let query = params.validate().map_err(AppError::Validation)?;
    Ok(Json(state.service.cheapest_route(&query).await?))
}

pub async fn contextual_search(
    State(state): State<AppState>,
    Query(params): Query<TripQueryParams>,
) -> Result<Json<ContextualResponse>, AppError> {
    let query = params.validate().map_err(AppError::Validation)?;
    Ok(Json(state.service.contextual_search(&query).await?))
}

pub async fn search_trips_v2(
    State(state): State<AppState>,
    Query(params): Query<TripQueryParams>,
) -> Result<Json<TripSearchV2Response>, AppError> {
    let query = params.validate().map_err(AppError::Validation)?;
    state.usage.record(ApiVersion::V2);
    Ok(Json(state.service.search_trips_v2(&query).await?))
}

pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    tracing::info!("Metrics requested");
    Json(MetricsResponse {
        usage: state.usage.report(),
        circuit_breaker: state.service.weather_breaker().stats(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
