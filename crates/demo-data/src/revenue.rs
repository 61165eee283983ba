//! Revenue time series generator.

use insights_core::{Clock, DemoConfig, GenerationParams, Granularity, InsightsResult, TimeRange};

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::base::generate_base_metrics;
use crate::seed::random_in_range;
use crate::timerange::resolve_range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// `YYYY-MM-DD` for daily buckets, RFC 3339 for hourly ones.
    pub date: String,
    pub value: f64,
}

/// Bucket starts covering `range`, hourly for day-or-shorter windows.
pub(crate) fn bucket_starts(range: &TimeRange) -> Vec<DateTime<Utc>> {
    let mut starts = Vec::new();
    if range.is_empty() {
        return starts;
    }
    let step = match range.granularity() {
        Granularity::Hourly => Duration::hours(1),
        Granularity::Daily => Duration::days(1),
    };
    let mut cursor = range.start;
    while cursor < range.end {
        starts.push(cursor);
        cursor += step;
    }
    starts
}

pub(crate) fn bucket_label(start: DateTime<Utc>, granularity: Granularity) -> String {
    match granularity {
        Granularity::Hourly => start.with_nanosecond(0).unwrap_or(start).to_rfc3339(),
        Granularity::Daily => start.format("%Y-%m-%d").to_string(),
    }
}

/// Walk each bucket in the window, compounding a small daily growth and
/// applying bounded seeded noise (±30%) to the window's average bucket
/// revenue. Day and hour granularity share the same noise mechanism.
pub fn generate_revenue_series(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<TimeSeriesPoint>> {
    let range = resolve_range(params.period, params.start_date, params.end_date, clock)?;
    let base = generate_base_metrics(params, clock, config)?;

    let starts = bucket_starts(&range);
    if starts.is_empty() {
        return Ok(Vec::new());
    }

    let granularity = range.granularity();
    let average = base.total_revenue / starts.len() as f64;
    // Mild upward drift across the window so later buckets trend higher.
    let daily_growth = random_in_range(&format!("{}:series_growth", params.account_id), 0.001, 0.004, 0);
    let per_bucket_growth = match granularity {
        Granularity::Hourly => daily_growth / 24.0,
        Granularity::Daily => daily_growth,
    };

    let series = starts
        .into_iter()
        .enumerate()
        .map(|(i, start)| {
            let noise = random_in_range(
                &format!("{}:revenue_series", params.account_id),
                0.7,
                1.3,
                i as u64,
            );
            let drift = (1.0 + per_bucket_growth).powi(i as i32);
            TimeSeriesPoint {
                date: bucket_label(start, granularity),
                value: (average * drift * noise).max(0.0),
            }
        })
        .collect();
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use insights_core::{FixedClock, GenerationParams, Period};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap())
    }

    #[test]
    fn test_week_produces_daily_points() {
        let params = GenerationParams::new("acme", Period::Week);
        let series = generate_revenue_series(&params, &clock(), &DemoConfig::default()).unwrap();
        assert_eq!(series.len(), 7);
        for point in &series {
            assert!(point.value >= 0.0);
        }
    }

    #[test]
    fn test_today_produces_hourly_points() {
        let params = GenerationParams::new("acme", Period::Today);
        let series = generate_revenue_series(&params, &clock(), &DemoConfig::default()).unwrap();
        assert_eq!(series.len(), 24);
    }

    #[test]
    fn test_dates_are_monotonic() {
        let params = GenerationParams::new("acme", Period::Month);
        let series = generate_revenue_series(&params, &clock(), &DemoConfig::default()).unwrap();
        for pair in series.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn test_series_sums_close_to_base_revenue() {
        let params = GenerationParams::new("acme", Period::Week);
        let config = DemoConfig::default();
        let base =
            crate::base::generate_base_metrics(&params, &clock(), &config).unwrap();
        let series = generate_revenue_series(&params, &clock(), &config).unwrap();
        let sum: f64 = series.iter().map(|p| p.value).sum();
        // Noise is bounded at ±30% per bucket, so the total stays in the
        // same order of magnitude as the base revenue.
        assert!(sum > base.total_revenue * 0.6);
        assert!(sum < base.total_revenue * 1.5);
    }

    #[test]
    fn test_deterministic() {
        let params = GenerationParams::new("acme", Period::Month);
        let config = DemoConfig::default();
        let a = generate_revenue_series(&params, &clock(), &config).unwrap();
        let b = generate_revenue_series(&params, &clock(), &config).unwrap();
        assert_eq!(a, b);
    }
}
