//! Forward-looking and diagnostic generators: revenue forecast, friction
//! score and trend, CAC by channel and trend, and optimization ROI.

use insights_core::{Clock, DemoConfig, GenerationParams, InsightsResult};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::base::generate_base_metrics;
use crate::breakdown::weighted_shares;
use crate::revenue::TimeSeriesPoint;
use crate::seed::random_in_range;
use crate::timerange::resolve_range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: String,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    /// Shrinks monotonically with horizon distance.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrictionFactor {
    pub factor: String,
    /// Contribution to the overall score, in points.
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrictionScore {
    /// 0 (frictionless) to 100.
    pub score: f64,
    pub level: String,
    pub factors: Vec<FrictionFactor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacChannel {
    pub channel: String,
    pub spend: f64,
    pub acquisitions: u64,
    pub cac: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRoi {
    pub initiative: String,
    pub cost: f64,
    pub incremental_revenue: f64,
    /// `None` when cost is zero; the formatted field then reads `"∞"`.
    pub roi: Option<f64>,
    pub roi_formatted: String,
}

const CAC_CHANNELS: &[(&str, f64)] = &[
    ("google_ads", 0.34),
    ("meta_ads", 0.26),
    ("email", 0.16),
    ("organic", 0.14),
    ("affiliates", 0.10),
];

/// Days to project forward: mirror the window, clamped to a useful band.
fn forecast_horizon(window_days: i64) -> i64 {
    window_days.clamp(7, 30)
}

/// Project revenue past the window end. Intervals widen and confidence
/// shrinks monotonically with horizon distance.
pub fn generate_forecast(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<ForecastPoint>> {
    let range = resolve_range(params.period, params.start_date, params.end_date, clock)?;
    let base = generate_base_metrics(params, clock, config)?;
    if range.is_empty() {
        return Ok(Vec::new());
    }

    let daily_revenue = base.total_revenue / range.elapsed_days();
    let horizon = forecast_horizon(range.num_days());
    let growth = random_in_range(&format!("{}:forecast_growth", params.account_id), 0.0005, 0.003, 0);

    let points = (0..horizon)
        .map(|day| {
            let date = range.end + Duration::days(day + 1);
            let predicted = daily_revenue * (1.0 + growth).powi(day as i32 + 1);
            // Uncertainty grows 2.5% per day out.
            let spread = predicted * 0.025 * (day + 1) as f64;
            ForecastPoint {
                date: date.format("%Y-%m-%d").to_string(),
                predicted,
                lower: (predicted - spread).max(0.0),
                upper: predicted + spread,
                confidence: (95.0 - 1.5 * day as f64).max(50.0),
            }
        })
        .collect();
    Ok(points)
}

fn friction_level(score: f64) -> &'static str {
    match score {
        s if s < 25.0 => "low",
        s if s < 50.0 => "moderate",
        s if s < 75.0 => "high",
        _ => "severe",
    }
}

pub fn generate_friction_score(
    params: &GenerationParams,
    clock: &dyn Clock,
    _config: &DemoConfig,
) -> InsightsResult<FrictionScore> {
    // Resolve so custom-period errors surface here too.
    resolve_range(params.period, params.start_date, params.end_date, clock)?;
    let seed = format!("{}:friction", params.account_id);
    let score = random_in_range(&seed, 15.0, 70.0, 0);

    let factor_pool: &[&str] = &[
        "form_field_count",
        "payment_declines",
        "slow_shipping_quote",
        "forced_account_creation",
        "address_validation_errors",
    ];
    let mut remaining = score;
    let factors = factor_pool
        .iter()
        .enumerate()
        .map(|(i, factor)| {
            let impact = if i == factor_pool.len() - 1 {
                remaining
            } else {
                let slice = remaining * random_in_range(&seed, 0.2, 0.45, i as u64 + 1);
                remaining -= slice;
                slice
            };
            FrictionFactor {
                factor: (*factor).to_string(),
                impact,
            }
        })
        .collect();

    Ok(FrictionScore {
        score,
        level: friction_level(score).to_string(),
        factors,
    })
}

/// Daily friction score across the window, same seeded-noise mechanism as
/// the revenue series.
pub fn generate_friction_trend(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<TimeSeriesPoint>> {
    let range = resolve_range(params.period, params.start_date, params.end_date, clock)?;
    let score = generate_friction_score(params, clock, config)?.score;

    let points = crate::revenue::bucket_starts(&range)
        .into_iter()
        .enumerate()
        .map(|(i, start)| {
            let noise = random_in_range(
                &format!("{}:friction_trend", params.account_id),
                0.85,
                1.15,
                i as u64,
            );
            TimeSeriesPoint {
                date: crate::revenue::bucket_label(start, range.granularity()),
                value: (score * noise).clamp(0.0, 100.0),
            }
        })
        .collect();
    Ok(points)
}

pub fn generate_cac_channels(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<CacChannel>> {
    let base = generate_base_metrics(params, clock, config)?;
    // Marketing spend is a seeded slice of revenue.
    let spend_rate = random_in_range(&format!("{}:spend_rate", params.account_id), 0.08, 0.18, 0);
    let total_spend = base.total_revenue * spend_rate;

    let rows = weighted_shares(&params.account_id, "cac", CAC_CHANNELS)
        .into_iter()
        .map(|row| {
            let spend = total_spend * row.share;
            // Organic traffic costs nothing per se; its share only reflects
            // attributed acquisitions.
            let acquisitions = (base.total_conversions as f64 * row.share).round() as u64;
            CacChannel {
                channel: row.name.to_string(),
                spend,
                acquisitions,
                cac: if acquisitions > 0 {
                    spend / acquisitions as f64
                } else {
                    0.0
                },
                percentage: row.share * 100.0,
            }
        })
        .collect();
    Ok(rows)
}

/// Blended daily CAC across the window.
pub fn generate_cac_trend(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<TimeSeriesPoint>> {
    let range = resolve_range(params.period, params.start_date, params.end_date, clock)?;
    let channels = generate_cac_channels(params, clock, config)?;
    let total_spend: f64 = channels.iter().map(|c| c.spend).sum();
    let total_acquisitions: u64 = channels.iter().map(|c| c.acquisitions).sum();
    let blended = if total_acquisitions > 0 {
        total_spend / total_acquisitions as f64
    } else {
        0.0
    };

    let points = crate::revenue::bucket_starts(&range)
        .into_iter()
        .enumerate()
        .map(|(i, start)| {
            let noise = random_in_range(
                &format!("{}:cac_trend", params.account_id),
                0.8,
                1.2,
                i as u64,
            );
            TimeSeriesPoint {
                date: crate::revenue::bucket_label(start, range.granularity()),
                value: (blended * noise).max(0.0),
            }
        })
        .collect();
    Ok(points)
}

/// ROI per optimization initiative. A zero-cost initiative has unbounded
/// ROI and reports the literal `"∞"` in its formatted field.
pub fn generate_optimization_roi(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<OptimizationRoi>> {
    let base = generate_base_metrics(params, clock, config)?;
    let initiatives: &[(&str, f64)] = &[
        ("one_click_checkout", 0.012),
        ("address_autofill", 0.006),
        ("pix_discount", 0.009),
        ("exit_intent_coupon", 0.004),
        // Copy changes ship for free.
        ("checkout_copy_tweaks", 0.0),
    ];

    let rows = initiatives
        .iter()
        .map(|(name, cost_rate)| {
            let seed = format!("{}:roi:{}", params.account_id, name);
            let cost = base.total_revenue * cost_rate;
            let incremental_revenue =
                base.total_revenue * random_in_range(&seed, 0.01, 0.05, 0);
            let roi = if cost > 0.0 {
                Some((incremental_revenue - cost) / cost * 100.0)
            } else {
                None
            };
            OptimizationRoi {
                initiative: (*name).to_string(),
                cost,
                incremental_revenue,
                roi,
                roi_formatted: match roi {
                    Some(value) => format!("{:.0}%", value),
                    None => "∞".to_string(),
                },
            }
        })
        .collect();
    Ok(rows)
}
