//! Base metrics generator — the single source of truth for a tenant's
//! sessions, conversions, revenue, and orders in a window. Every derived
//! generator re-invokes this rather than sharing state, which is what keeps
//! dozens of independent endpoints numerically consistent.

use insights_core::{BaseMetrics, Clock, DemoConfig, GenerationParams, InsightsResult, TimeRange};

use chrono::{DateTime, TimeZone, Utc};

use crate::seed::random_in_range;
use crate::timerange::resolve_range;

/// Fixed epoch growth compounds from. Anchoring here (rather than to the
/// window itself) is what makes a window's revenue exceed the preceding
/// window's, so `revenue_growth` is non-trivial.
fn growth_anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Compound a monthly rate over the days between `from` and `to`.
fn growth_factor(from: DateTime<Utc>, to: DateTime<Utc>, monthly_rate: f64) -> f64 {
    let days = (to - from).num_seconds() as f64 / 86_400.0;
    if days <= 0.0 {
        return 1.0;
    }
    (1.0 + monthly_rate).powf(days / 30.0)
}

/// Revenue a tenant earns over `range`, before rounding.
fn revenue_for_range(account_id: &str, range: &TimeRange, config: &DemoConfig) -> f64 {
    if range.is_empty() {
        return 0.0;
    }
    let scale = random_in_range(&format!("{}:scale", account_id), 0.7, 1.3, 0);
    let monthly_rate = random_in_range(
        &format!("{}:growth", account_id),
        config.growth.monthly_growth_min,
        config.growth.monthly_growth_max,
        0,
    );
    let daily_baseline = config.annual_revenue / 365.0 * scale;
    let midpoint = range.start + (range.end - range.start) / 2;
    daily_baseline * range.elapsed_days() * growth_factor(growth_anchor(), midpoint, monthly_rate)
}

/// Conversion rate in percent for the window, seeded per account and
/// improving slightly per elapsed month, capped at the configured ceiling.
fn conversion_rate_for_range(account_id: &str, range: &TimeRange, config: &DemoConfig) -> f64 {
    let base = random_in_range(
        &format!("{}:conversion", account_id),
        config.growth.conversion_min,
        config.growth.conversion_max,
        0,
    );
    let months = ((range.end - growth_anchor()).num_seconds() as f64 / 86_400.0 / 30.0).max(0.0);
    (base + months * config.growth.conversion_improvement_per_month).min(config.growth.conversion_cap)
}

/// Generate base metrics for an already-resolved window.
pub fn base_metrics_for_range(
    account_id: &str,
    range: &TimeRange,
    config: &DemoConfig,
) -> BaseMetrics {
    if range.is_empty() {
        return BaseMetrics::zero();
    }

    let total_revenue = revenue_for_range(account_id, range, config);
    let conversion_rate = conversion_rate_for_range(account_id, range, config);

    let avg_order_value = config.avg_order_value
        * random_in_range(&format!("{}:aov", account_id), 0.9, 1.1, 0);
    let total_orders = if avg_order_value > 0.0 {
        (total_revenue / avg_order_value).round() as u64
    } else {
        0
    };
    // A conversion is a completed order.
    let total_conversions = total_orders;
    let total_sessions = if conversion_rate > 0.0 {
        (total_orders as f64 / (conversion_rate / 100.0)).round() as u64
    } else {
        0
    };

    let previous_revenue = revenue_for_range(account_id, &range.preceding(), config);
    let revenue_growth = if previous_revenue > 0.0 {
        (total_revenue - previous_revenue) / previous_revenue * 100.0
    } else {
        0.0
    };

    BaseMetrics {
        total_sessions,
        total_conversions,
        total_revenue,
        total_orders,
        avg_order_value,
        conversion_rate,
        abandonment_rate: 100.0 - conversion_rate,
        avg_checkout_time: random_in_range(&format!("{}:checkout_time", account_id), 180.0, 420.0, 0),
        revenue_growth,
    }
}

/// Resolve the window for `params` and generate its base metrics.
pub fn generate_base_metrics(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<BaseMetrics> {
    let range = resolve_range(params.period, params.start_date, params.end_date, clock)?;
    Ok(base_metrics_for_range(&params.account_id, &range, config))
}
