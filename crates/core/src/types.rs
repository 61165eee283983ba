use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InsightsError;

/// Logical reporting period selected by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
    /// Requires explicit start and end dates.
    Custom,
}

impl Period {
    /// Fixed backward extent of a named period. `Custom` has none.
    pub fn length(&self) -> Option<Duration> {
        match self {
            Period::Today => Some(Duration::days(1)),
            Period::Week => Some(Duration::days(7)),
            Period::Month => Some(Duration::days(30)),
            Period::Year => Some(Duration::days(365)),
            Period::Custom => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::Custom => "custom",
        }
    }
}

impl std::str::FromStr for Period {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "custom" => Ok(Period::Custom),
            other => Err(InsightsError::InvalidQuery {
                name: "period".to_string(),
                message: format!("unknown period '{}'", other),
            }),
        }
    }
}

/// Everything a generator call depends on. Owned per call, never persisted;
/// together with the injected clock it fully determines all output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub account_id: String,
    pub period: Period,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl GenerationParams {
    pub fn new(account_id: impl Into<String>, period: Period) -> Self {
        Self {
            account_id: account_id.into(),
            period,
            start_date: None,
            end_date: None,
        }
    }

    pub fn custom(
        account_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            period: Period::Custom,
            start_date: Some(start),
            end_date: Some(end),
        }
    }
}

/// A concrete half-open `[start, end)` window produced by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Bucket size for time-series entities derived from a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Hourly,
    Daily,
}

impl TimeRange {
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Elapsed days as a fraction, never negative.
    pub fn elapsed_days(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (self.end - self.start).num_seconds() as f64 / 86_400.0
    }

    /// Whole days covered, counting a partial trailing day.
    pub fn num_days(&self) -> i64 {
        self.elapsed_days().ceil() as i64
    }

    /// Windows of a day or less chart hourly, everything else daily.
    pub fn granularity(&self) -> Granularity {
        if self.elapsed_days() <= 1.0 {
            Granularity::Hourly
        } else {
            Granularity::Daily
        }
    }

    /// The equally-sized window immediately before this one.
    pub fn preceding(&self) -> TimeRange {
        let span = self.end - self.start;
        TimeRange {
            start: self.start - span,
            end: self.start,
        }
    }
}

/// Single source of truth for a tenant's headline numbers in a window.
/// Every other generator re-derives from these rather than sharing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseMetrics {
    pub total_sessions: u64,
    pub total_conversions: u64,
    pub total_revenue: f64,
    pub total_orders: u64,
    pub avg_order_value: f64,
    /// Percent, capped at the configured ceiling (15 by default).
    pub conversion_rate: f64,
    pub abandonment_rate: f64,
    /// Seconds.
    pub avg_checkout_time: f64,
    /// Percent change versus the immediately preceding equal window.
    pub revenue_growth: f64,
}

impl BaseMetrics {
    pub fn zero() -> Self {
        Self {
            total_sessions: 0,
            total_conversions: 0,
            total_revenue: 0.0,
            total_orders: 0,
            avg_order_value: 0.0,
            conversion_rate: 0.0,
            abandonment_rate: 0.0,
            avg_checkout_time: 0.0,
            revenue_growth: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_parse_roundtrip() {
        for name in ["today", "week", "month", "year", "custom"] {
            let period: Period = name.parse().unwrap();
            assert_eq!(period.as_str(), name);
        }
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn test_preceding_window_is_adjacent_and_equal() {
        let range = TimeRange {
            start: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 6, 8, 0, 0, 0).unwrap(),
        };
        let prev = range.preceding();
        assert_eq!(prev.end, range.start);
        assert_eq!(prev.end - prev.start, range.end - range.start);
    }

    #[test]
    fn test_granularity_boundary() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let hourly = TimeRange {
            start,
            end: start + Duration::hours(24),
        };
        let daily = TimeRange {
            start,
            end: start + Duration::hours(25),
        };
        assert_eq!(hourly.granularity(), Granularity::Hourly);
        assert_eq!(daily.granularity(), Granularity::Daily);
    }
}
