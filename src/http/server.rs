//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build downstream clients and the weather breaker from config
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::aggregator::{AggregatorService, VersionUsage};
use crate::config::AggregatorConfig;
use crate::downstream::DownstreamClient;
use crate::http::handlers;
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::lifecycle::startup::StartupError;
use crate::observability::metrics;
use crate::resilience::CircuitBreaker;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: AggregatorService,
    pub usage: Arc<VersionUsage>,
}

impl AppState {
    /// Build every subsystem the handlers need.
    pub fn from_config(config: &AggregatorConfig) -> Result<Self, StartupError> {
        let client = DownstreamClient::new(config.services.clone(), &config.timeouts)?;
        let weather_breaker =
            Arc::new(CircuitBreaker::new(config.weather_breaker.clone())?.with_name("weather"));

        tracing::info!(
            failure_threshold = config.weather_breaker.failure_threshold,
            window_size = config.weather_breaker.window_size,
            cooldown_ms = config.weather_breaker.cooldown_ms,
            half_open_probes = config.weather_breaker.half_open_probes,
            "Weather circuit breaker configured"
        );

        let service = AggregatorService::new(
            client,
            weather_breaker,
            Duration::from_millis(config.timeouts.weather_ms),
        );
        Ok(Self {
            service,
            usage: Arc::new(VersionUsage::new()),
        })
    }
}

/// HTTP server for the aggregator.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: AggregatorConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AggregatorConfig) -> Result<Self, StartupError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AggregatorConfig, state: AppState) -> Router {
        Router::new()
            .route("/v1/trips/search", get(handlers::search_trips_v1))
            .route("/v1/trips/cheapest-route", get(handlers::cheapest_route))
            .route("/v1/trips/contextual", get(handlers::contextual_search))
            .route("/v2/trips/search", get(handlers::search_trips_v2))
            .route("/metrics", get(handlers::get_metrics))
            .route("/health", get(handlers::health))
            .route_layer(middleware::from_fn(track_requests))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Shared state, e.g. to read breaker stats from outside the router.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }
}

/// Record count and latency per matched route.
async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    let status = response.status();
    metrics::record_request(&route, status.as_u16(), start);

    if status.is_server_error() {
        tracing::warn!(route = %route, status = %status, "Request failed");
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request as HttpRequest, StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        let config = AggregatorConfig::default();
        let state = AppState::from_config(&config).unwrap();
        HttpServer::build_router(&config, state)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Response, serde_json::Value) {
        let response = router
            .oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, Response::from_parts(parts, Body::empty()), json)
    }

    #[tokio::test]
    async fn test_health_sets_request_id() {
        let (status, response, body) = get_json(router(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_invalid_query_rejected_before_counting() {
        let config = AggregatorConfig::default();
        let state = AppState::from_config(&config).unwrap();
        let router = HttpServer::build_router(&config, state.clone());

        let (status, _, body) = get_json(router, "/v1/trips/search?from=NYC&date=2026-13").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"][0], "To location must be provided");
        assert_eq!(body["message"][1], "Date must be in YYYY-MM-DD format");
        assert_eq!(state.usage.counts().v1, 0);
    }

    #[tokio::test]
    async fn test_metrics_includes_breaker_stats() {
        let (status, _, body) = get_json(router(), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalRequests"], 0);
        assert_eq!(body["v1Percentage"], "0%");
        assert_eq!(body["circuitBreaker"]["state"], "CLOSED");
        assert_eq!(body["circuitBreaker"]["name"], "weather");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _, _) = get_json(router(), "/v3/trips/search").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
