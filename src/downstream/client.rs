//! HTTP client for the flights, hotels, weather and events services.
//!
//! # Responsibilities
//! - Build service URLs with encoded query parameters
//! - Bound every call by the configured downstream timeout
//! - Decode JSON envelopes and classify failures
//! - Log and record metrics per call

use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::{ServicesConfig, TimeoutConfig};
use crate::downstream::error::{DownstreamError, Service};
use crate::downstream::types::{EventsResponse, FlightsResponse, HotelsResponse, WeatherReport};
use crate::observability::metrics;

/// Client for every downstream service, cheap to clone.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
    services: ServicesConfig,
    timeout: Duration,
}

impl DownstreamClient {
    /// Create a client. Fails only if the TLS backend cannot initialise.
    pub fn new(services: ServicesConfig, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_millis(timeouts.downstream_ms);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trip-aggregator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            services,
            timeout,
        })
    }

    /// `GET /flights/search?from&to&date`
    pub async fn search_flights(
        &self,
        from: &str,
        to: &str,
        date: &str,
    ) -> Result<FlightsResponse, DownstreamError> {
        let url = self.url(
            Service::Flights,
            "/flights/search",
            &[("from", from), ("to", to), ("date", date)],
        )?;
        let response: FlightsResponse = self.get(Service::Flights, url).await?;
        tracing::debug!(
            count = response.flights.len(),
            "Flight service returned flights"
        );
        Ok(response)
    }

    /// `GET /hotels/search?destination&date[&lateCheckIn]`
    pub async fn search_hotels(
        &self,
        destination: &str,
        date: &str,
        late_check_in: Option<bool>,
    ) -> Result<HotelsResponse, DownstreamError> {
        let late = late_check_in.map(|l| l.to_string());
        let mut query = vec![("destination", destination), ("date", date)];
        if let Some(late) = late.as_deref() {
            query.push(("lateCheckIn", late));
        }
        let url = self.url(Service::Hotels, "/hotels/search", &query)?;
        let response: HotelsResponse = self.get(Service::Hotels, url).await?;
        tracing::debug!(
            count = response.hotels.len(),
            "Hotel service returned hotels"
        );
        Ok(response)
    }

    /// `GET /weather/forecast?destination`
    pub async fn weather_forecast(&self, destination: &str) -> Result<WeatherReport, DownstreamError> {
        let url = self.url(
            Service::Weather,
            "/weather/forecast",
            &[("destination", destination)],
        )?;
        let mut report: WeatherReport = self.get(Service::Weather, url).await?;
        if report.destination.is_empty() {
            report.destination = destination.to_string();
        }
        tracing::debug!(
            days = report.forecast.len(),
            "Weather service returned forecast"
        );
        Ok(report)
    }

    /// `GET /events/search?destination&date`
    pub async fn search_events(
        &self,
        destination: &str,
        date: &str,
    ) -> Result<EventsResponse, DownstreamError> {
        let url = self.url(
            Service::Events,
            "/events/search",
            &[("destination", destination), ("date", date)],
        )?;
        let response: EventsResponse = self.get(Service::Events, url).await?;
        tracing::debug!(
            count = response.events.len(),
            "Events service returned events"
        );
        Ok(response)
    }

    fn base_url(&self, service: Service) -> &str {
        match service {
            Service::Flights => &self.services.flights_url,
            Service::Hotels => &self.services.hotels_url,
            Service::Weather => &self.services.weather_url,
            Service::Events => &self.services.events_url,
        }
    }

    fn url(&self, service: Service, path: &str, query: &[(&str, &str)]) -> Result<Url, DownstreamError> {
        let mut url = Url::parse(self.base_url(service))
            .and_then(|base| base.join(path))
            .map_err(|source| DownstreamError::Url { service, source })?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, service: Service, url: Url) -> Result<T, DownstreamError> {
        let start = Instant::now();
        tracing::debug!(service = %service, url = %url, "Calling downstream service");

        let result = self.send(service, url).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(DownstreamError::Timeout { .. }) => "timeout",
            Err(_) => "error",
        };
        metrics::record_downstream(service.as_str(), outcome, start);

        if let Err(e) = &result {
            tracing::error!(service = %service, error = %e, "Downstream service error");
        }
        result
    }

    async fn send<T: DeserializeOwned>(&self, service: Service, url: Url) -> Result<T, DownstreamError> {
        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.classify(service, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownstreamError::Status {
                service,
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(service, e)
            } else {
                DownstreamError::Decode { service, source: e }
            }
        })
    }

    fn classify(&self, service: Service, e: reqwest::Error) -> DownstreamError {
        if e.is_timeout() {
            DownstreamError::Timeout {
                service,
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            DownstreamError::Request { service, source: e }
        }
    }
}
