//! API version usage tracking for the v1 → v2 migration.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::observability::metrics;

/// v2 share (percent) above which v1 is reported as deprecated.
pub const V1_DEPRECATION_THRESHOLD_PCT: f64 = 75.0;

/// API versions of the trip search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }
}

/// Thread-safe per-version request counters.
#[derive(Debug, Default)]
pub struct VersionUsage {
    v1: AtomicU64,
    v2: AtomicU64,
}

/// Raw counts, serialized as `apiVersionUsage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionCounts {
    pub v1: u64,
    pub v2: u64,
}

/// Usage report served by `/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub api_version_usage: VersionCounts,
    pub v1_percentage: String,
    pub v2_percentage: String,
    #[serde(rename = "isV1Deprecated")]
    pub is_v1_deprecated: bool,
    pub total_requests: u64,
}

impl VersionUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request against `version`.
    pub fn record(&self, version: ApiVersion) {
        let counter = match version {
            ApiVersion::V1 => &self.v1,
            ApiVersion::V2 => &self.v2,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::record_api_version(version.as_str());
    }

    pub fn counts(&self) -> VersionCounts {
        VersionCounts {
            v1: self.v1.load(Ordering::Relaxed),
            v2: self.v2.load(Ordering::Relaxed),
        }
    }

    /// Percentages and deprecation status from the current counts.
    pub fn report(&self) -> UsageReport {
        let counts = self.counts();
        let total = counts.v1 + counts.v2;

        let pct = |n: u64| {
            if total > 0 {
                n as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };
        let format_pct = |n: u64| {
            if total > 0 {
                format!("{:.2}%", pct(n))
            } else {
                "0%".to_string()
            }
        };

        let is_v1_deprecated = counts.v2 > 0 && pct(counts.v2) > V1_DEPRECATION_THRESHOLD_PCT;
        if is_v1_deprecated {
            tracing::warn!(
                v2_percentage = pct(counts.v2),
                "V1 API deprecated"
            );
        }

        UsageReport {
            api_version_usage: counts,
            v1_percentage: format_pct(counts.v1),
            v2_percentage: format_pct(counts.v2),
            is_v1_deprecated,
            total_requests: total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = VersionUsage::new().report();
        assert_eq!(report.total_requests, 0);
        assert_eq!(report.v1_percentage, "0%");
        assert_eq!(report.v2_percentage, "0%");
        assert!(!report.is_v1_deprecated);
    }

    #[test]
    fn test_percentages_two_decimals() {
        let usage = VersionUsage::new();
        usage.record(ApiVersion::V1);
        usage.record(ApiVersion::V2);
        usage.record(ApiVersion::V2);

        let report = usage.report();
        assert_eq!(report.api_version_usage, VersionCounts { v1: 1, v2: 2 });
        assert_eq!(report.v1_percentage, "33.33%");
        assert_eq!(report.v2_percentage, "66.67%");
        assert!(!report.is_v1_deprecated);
    }

    #[test]
    fn test_deprecation_requires_more_than_threshold() {
        let usage = VersionUsage::new();
        usage.record(ApiVersion::V1);
        for _ in 0..3 {
            usage.record(ApiVersion::V2);
        }
        // Exactly 75% is not enough.
        assert!(!usage.report().is_v1_deprecated);

        usage.record(ApiVersion::V2);
        let report = usage.report();
        assert!(report.is_v1_deprecated);
        assert_eq!(report.v2_percentage, "80.00%");
    }

    #[test]
    fn test_report_serialization() {
        let usage = VersionUsage::new();
        usage.record(ApiVersion::V2);
        let json = serde_json::to_value(usage.report()).unwrap();
        assert_eq!(json["apiVersionUsage"]["v2"], 1);
        assert_eq!(json["v2Percentage"], "100.00%");
        assert_eq!(json["isV1Deprecated"], true);
        assert_eq!(json["totalRequests"], 1);
    }
}
