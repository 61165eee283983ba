//! Cohort, retention, and lifetime-value generators.

use insights_core::{Clock, DemoConfig, GenerationParams, InsightsResult};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::base::generate_base_metrics;
use crate::seed::random_in_range;
use crate::timerange::resolve_range;

/// One acquisition cohort and its retention curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRow {
    /// First day of the cohort's acquisition week, `YYYY-MM-DD`.
    pub cohort: String,
    pub customers: u64,
    /// Percent retained per elapsed period, strictly starting at 100.
    pub retention: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionPoint {
    pub period: u32,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtvBucket {
    pub bucket: String,
    pub customers: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LtvMetrics {
    pub avg_ltv: f64,
    pub median_ltv: f64,
    pub top_decile_ltv: f64,
    pub avg_orders_per_customer: f64,
    pub repeat_purchase_rate: f64,
    pub distribution: Vec<LtvBucket>,
}

const COHORT_COUNT: u32 = 6;
const RETENTION_PERIODS: u32 = 8;

/// Weekly acquisition cohorts ending at the window, each with a seeded but
/// monotonically decaying retention curve.
pub fn generate_cohorts(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<CohortRow>> {
    let range = resolve_range(params.period, params.start_date, params.end_date, clock)?;
    let base = generate_base_metrics(params, clock, config)?;
    if range.is_empty() {
        return Ok(Vec::new());
    }

    let weekly_customers = base.total_conversions as f64 / COHORT_COUNT as f64;
    let rows = (0..COHORT_COUNT)
        .map(|i| {
            let week_start = range.end - Duration::weeks(i64::from(COHORT_COUNT - i));
            let size_jitter = random_in_range(
                &format!("{}:cohort:{}:size", params.account_id, i),
                0.75,
                1.25,
                0,
            );
            let mut retention = Vec::with_capacity(RETENTION_PERIODS as usize);
            let mut rate = 100.0;
            for period in 0..RETENTION_PERIODS {
                retention.push(rate);
                let decay = random_in_range(
                    &format!("{}:cohort:{}:decay", params.account_id, i),
                    0.55,
                    0.8,
                    u64::from(period),
                );
                rate *= decay;
            }
            CohortRow {
                cohort: week_start.format("%Y-%m-%d").to_string(),
                customers: (weekly_customers * size_jitter).round() as u64,
                retention,
            }
        })
        .collect();
    Ok(rows)
}

/// Aggregate retention curve across cohorts; decays monotonically with
/// elapsed period count.
pub fn generate_retention(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<RetentionPoint>> {
    let cohorts = generate_cohorts(params, clock, config)?;
    if cohorts.is_empty() {
        return Ok(Vec::new());
    }
    let points = (0..RETENTION_PERIODS)
        .map(|period| {
            let total: f64 = cohorts
                .iter()
                .map(|c| c.retention[period as usize])
                .sum();
            RetentionPoint {
                period,
                rate: total / cohorts.len() as f64,
            }
        })
        .collect();
    Ok(points)
}

pub fn generate_ltv(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<LtvMetrics> {
    let base = generate_base_metrics(params, clock, config)?;
    let seed = format!("{}:ltv", params.account_id);

    let avg_orders = random_in_range(&seed, 1.4, 3.2, 0);
    let avg_ltv = base.avg_order_value * avg_orders;
    // LTV is right-skewed: the median sits below the mean, the top decile
    // well above it.
    let median_ltv = avg_ltv * random_in_range(&seed, 0.6, 0.85, 1);
    let top_decile_ltv = avg_ltv * random_in_range(&seed, 2.2, 3.5, 2);

    let customers = base.total_conversions;
    let buckets: &[(&str, f64)] = &[
        ("0-50", 0.22),
        ("50-100", 0.28),
        ("100-250", 0.30),
        ("250-500", 0.13),
        ("500+", 0.07),
    ];
    let distribution = buckets
        .iter()
        .map(|(label, share)| {
            let jitter = random_in_range(&format!("{}:bucket:{}", seed, label), 0.85, 1.15, 0);
            LtvBucket {
                bucket: (*label).to_string(),
                customers: (customers as f64 * share * jitter).round() as u64,
            }
        })
        .collect();

    Ok(LtvMetrics {
        avg_ltv,
        median_ltv,
        top_decile_ltv,
        avg_orders_per_customer: avg_orders,
        repeat_purchase_rate: random_in_range(&seed, 18.0, 42.0, 3),
        distribution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use insights_core::{FixedClock, Period};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap())
    }

    fn params() -> GenerationParams {
        GenerationParams::new("acme", Period::Month)
    }

    #[test]
    fn test_retention_decays_monotonically() {
        let cohorts = generate_cohorts(&params(), &clock(), &DemoConfig::default()).unwrap();
        assert_eq!(cohorts.len(), COHORT_COUNT as usize);
        for cohort in &cohorts {
            assert_eq!(cohort.retention[0], 100.0);
            for pair in cohort.retention.windows(2) {
                assert!(pair[1] < pair[0]);
            }
        }
    }

    #[test]
    fn test_aggregate_retention_decays() {
        let points = generate_retention(&params(), &clock(), &DemoConfig::default()).unwrap();
        assert_eq!(points.len(), RETENTION_PERIODS as usize);
        for pair in points.windows(2) {
            assert!(pair[1].rate < pair[0].rate);
        }
    }

    #[test]
    fn test_cohort_dates_are_ordered() {
        let cohorts = generate_cohorts(&params(), &clock(), &DemoConfig::default()).unwrap();
        for pair in cohorts.windows(2) {
            assert!(pair[0].cohort < pair[1].cohort);
        }
    }

    #[test]
    fn test_ltv_shape() {
        let ltv = generate_ltv(&params(), &clock(), &DemoConfig::default()).unwrap();
        assert!(ltv.median_ltv < ltv.avg_ltv);
        assert!(ltv.top_decile_ltv > ltv.avg_ltv);
        assert!(ltv.avg_orders_per_customer >= 1.0);
        assert_eq!(ltv.distribution.len(), 5);
    }

    #[test]
    fn test_deterministic() {
        let config = DemoConfig::default();
        let a = generate_cohorts(&params(), &clock(), &config).unwrap();
        let b = generate_cohorts(&params(), &clock(), &config).unwrap();
        assert_eq!(a, b);
    }
}
