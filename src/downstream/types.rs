//! Downstream payload types.
//!
//! Envelopes are typed where the aggregator reads fields (flight prices and
//! arrival times); everything else is carried through as JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single flight offer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    /// ISO-8601 arrival time, e.g. `2026-03-01T23:15:00Z`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Flight {
    /// Arrival hour (0-23) parsed from `arrival_time`, if present.
    pub fn arrival_hour(&self) -> Option<u32> {
        let time = self.arrival_time.as_deref()?;
        let clock = match time.split_once('T') {
            Some((_, clock)) => clock,
            None => time,
        };
        let hour: u32 = clock.get(..2)?.parse().ok()?;
        (hour < 24).then_some(hour)
    }

    /// Arrivals between 22:00 and 04:59 need a late check-in.
    pub fn arrives_late(&self) -> bool {
        matches!(self.arrival_hour(), Some(h) if h >= 22 || h < 5)
    }
}

/// Response of `GET /flights/search`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FlightsResponse {
    #[serde(default)]
    pub flights: Vec<Flight>,
}

impl FlightsResponse {
    /// Cheapest priced flight; unpriced offers are ignored.
    pub fn cheapest(&self) -> Option<&Flight> {
        self.flights
            .iter()
            .filter(|f| f.price.is_some_and(|p| p.is_finite()))
            .min_by(|a, b| {
                let (a, b) = (a.price.unwrap_or(f64::MAX), b.price.unwrap_or(f64::MAX));
                a.total_cmp(&b)
            })
    }
}

/// Response of `GET /hotels/search`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HotelsResponse {
    #[serde(default)]
    pub hotels: Vec<Value>,
}

/// Response of `GET /events/search`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<Value>,
}

/// Weather for a destination, possibly a degraded placeholder.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeatherReport {
    #[serde(default)]
    pub destination: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default)]
    pub forecast: Vec<Value>,

    /// Set only on the placeholder; omitted from healthy reports.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Fields the weather service sends that the aggregator does not read.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WeatherReport {
    /// Placeholder served while the weather service is unavailable.
    pub fn unavailable(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            summary: Some("unavailable".to_string()),
            forecast: Vec::new(),
            degraded: true,
            message: Some("Weather service temporarily unavailable".to_string()),
            extra: Map::new(),
        }
    }
}
