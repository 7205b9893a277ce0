//! Trip search orchestration.
//!
//! # Responsibilities
//! - Fan out each search to the downstream services concurrently
//! - Guard the weather call on the v2 path with a circuit breaker
//! - Shape the combined response per endpoint
//!
//! # Design Decisions
//! - Flights and hotels are required: their errors fail the request
//! - Weather goes through the breaker with its own deadline; a timeout is an
//!   ordinary failure outcome
//! - The v2 fan-out joins without short-circuiting, so a failing sibling
//!   never cancels the guarded weather call
//! - The breaker is injected, so `/metrics` reads the same instance

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::aggregator::query::TripQuery;
use crate::downstream::{DownstreamClient, DownstreamError, Flight, Service, WeatherReport};
use crate::resilience::timeouts::with_timeout;
use crate::resilience::{CircuitBreaker, ExecuteError};

/// Errors surfaced by the aggregator.
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error(transparent)]
    Downstream(#[from] DownstreamError),

    #[error("no priced flights found from {from} to {to} on {date}")]
    NoFlights {
        from: String,
        to: String,
        date: String,
    },
}

impl From<ExecuteError<DownstreamError>> for AggregatorError {
    fn from(e: ExecuteError<DownstreamError>) -> Self {
        AggregatorError::Downstream(e.into_inner())
    }
}

/// `/v1/trips/search`
#[derive(Debug, Clone, Serialize)]
pub struct TripSearchResponse {
    pub flights: Vec<Flight>,
    pub hotels: Vec<Value>,
}

/// `/v2/trips/search`
#[derive(Debug, Clone, Serialize)]
pub struct TripSearchV2Response {
    pub flights: Vec<Flight>,
    pub hotels: Vec<Value>,
    pub weather: WeatherReport,
}

/// `/v1/trips/cheapest-route`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheapestRouteResponse {
    pub from: String,
    pub to: String,
    pub date: String,
    pub cheapest_flight: Flight,
    pub options_considered: usize,
}

/// `/v1/trips/contextual`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualResponse {
    pub flights: Vec<Flight>,
    /// The cheapest flight lands between 22:00 and 05:00.
    pub late_arrival: bool,
    pub hotels: Vec<Value>,
    /// Only fetched for daytime arrivals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Value>>,
}

/// Aggregates downstream services into trip search results.
#[derive(Debug, Clone)]
pub struct AggregatorService {
    client: DownstreamClient,
    weather_breaker: Arc<CircuitBreaker>,
    weather_timeout: Duration,
}

impl AggregatorService {
    pub fn new(
        client: DownstreamClient,
        weather_breaker: Arc<CircuitBreaker>,
        weather_timeout: Duration,
    ) -> Self {
        Self {
            client,
            weather_breaker,
            weather_timeout,
        }
    }

    pub fn weather_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.weather_breaker
    }

    /// Flights and hotels for the destination.
    pub async fn search_trips_v1(&self, q: &TripQuery) -> Result<TripSearchResponse, AggregatorError> {
        let (flights, hotels) = tokio::try_join!(
            self.client.search_flights(&q.from, &q.to, &q.date),
            self.client.search_hotels(&q.to, &q.date, None),
        )?;
        Ok(TripSearchResponse {
            flights: flights.flights,
            hotels: hotels.hotels,
        })
    }

    /// Flights and hotels plus a breaker-guarded weather forecast.
    ///
    /// All three calls run to completion before any error is returned, so
    /// the breaker records an outcome even when flights or hotels fail first.
    pub async fn search_trips_v2(&self, q: &TripQuery) -> Result<TripSearchV2Response, AggregatorError> {
        let (flights, hotels, weather) = tokio::join!(
            self.client.search_flights(&q.from, &q.to, &q.date),
            self.client.search_hotels(&q.to, &q.date, None),
            self.fetch_weather(&q.to),
        );
        Ok(TripSearchV2Response {
            flights: flights?.flights,
            hotels: hotels?.hotels,
            weather: weather?,
        })
    }

    /// Lowest priced flight on the route.
    pub async fn cheapest_route(&self, q: &TripQuery) -> Result<CheapestRouteResponse, AggregatorError> {
        let flights = self.client.search_flights(&q.from, &q.to, &q.date).await?;
        let cheapest = flights
            .cheapest()
            .cloned()
            .ok_or_else(|| AggregatorError::NoFlights {
                from: q.from.clone(),
                to: q.to.clone(),
                date: q.date.clone(),
            })?;

        Ok(CheapestRouteResponse {
            from: q.from.clone(),
            to: q.to.clone(),
            date: q.date.clone(),
            cheapest_flight: cheapest,
            options_considered: flights.flights.len(),
        })
    }

    /// Branch on the cheapest flight's arrival: late arrivals get late
    /// check-in hotels only, daytime arrivals get hotels and events.
    pub async fn contextual_search(&self, q: &TripQuery) -> Result<ContextualResponse, AggregatorError> {
        let flights = self.client.search_flights(&q.from, &q.to, &q.date).await?;
        let late_arrival = flights.cheapest().is_some_and(Flight::arrives_late);

        tracing::debug!(late_arrival, destination = %q.to, "Contextual branch selected");

        if late_arrival {
            let hotels = self.client.search_hotels(&q.to, &q.date, Some(true)).await?;
            Ok(ContextualResponse {
                flights: flights.flights,
                late_arrival,
                hotels: hotels.hotels,
                events: None,
            })
        } else {
            let (hotels, events) = tokio::try_join!(
                self.client.search_hotels(&q.to, &q.date, None),
                self.client.search_events(&q.to, &q.date),
            )?;
            Ok(ContextualResponse {
                flights: flights.flights,
                late_arrival,
                hotels: hotels.hotels,
                events: Some(events.events),
            })
        }
    }

    /// Weather through the breaker; degraded report when open or probing fails.
    pub async fn fetch_weather(&self, destination: &str) -> Result<WeatherReport, ExecuteError<DownstreamError>> {
        let timeout = self.weather_timeout;
        self.weather_breaker
            .execute(
                || {
                    with_timeout(timeout, self.client.weather_forecast(destination), || {
                        DownstreamError::Timeout {
                            service: Service::Weather,
                            after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                        }
                    })
                },
                || async {
                    tracing::warn!(destination, "Using weather fallback due to circuit breaker");
                    Ok(WeatherReport::unavailable(destination))
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServicesConfig, TimeoutConfig};
    use crate::resilience::{BreakerState, CircuitBreakerConfig};

    fn unreachable_service() -> AggregatorService {
        let services = ServicesConfig {
            weather_url: "http://127.0.0.1:1".into(),
            ..ServicesConfig::default()
        };
        let client = DownstreamClient::new(services, &TimeoutConfig::default()).unwrap();
        let breaker = CircuitBreaker::new(CircuitBreakerConfig::default()).unwrap();
        AggregatorService::new(client, Arc::new(breaker), Duration::from_millis(1000))
    }

    #[tokio::test]
    async fn test_weather_failure_opens_then_degrades() {
        let service = unreachable_service();

        let err = service.fetch_weather("Lisbon").await.unwrap_err();
        assert!(!err.is_fallback());
        assert_eq!(err.into_inner().service(), Service::Weather);
        assert_eq!(service.weather_breaker().state(), BreakerState::Open);

        let report = service.fetch_weather("Lisbon").await.unwrap();
        assert!(report.degraded);
        assert_eq!(report.destination, "Lisbon");
        assert_eq!(service.weather_breaker().stats().short_circuited, 1);
    }

    #[test]
    fn test_execute_error_maps_to_downstream() {
        let err = AggregatorError::from(ExecuteError::Primary(DownstreamError::Timeout {
            service: Service::Weather,
            after_ms: 1000,
        }));
        assert!(matches!(
            err,
            AggregatorError::Downstream(DownstreamError::Timeout { after_ms: 1000, .. })
        ));
    }
}
