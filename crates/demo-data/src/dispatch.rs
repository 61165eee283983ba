//! Endpoint dispatcher/shaper.
//!
//! Maps an endpoint key plus query parameters onto the matching generators
//! and reshapes the result into the exact JSON contract of the corresponding
//! live endpoint: camelCase field names, monetary values and percentages
//! rounded to two decimals. Unknown keys are non-fatal.

use std::collections::HashMap;

use insights_core::{Clock, DemoConfig, GenerationParams, InsightsError, InsightsResult};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::base::generate_base_metrics;
use crate::breakdown::{
    generate_browsers, generate_coupons, generate_devices, generate_geography,
    generate_micro_conversions, generate_payment_methods, generate_segments,
    generate_shipping_methods,
};
use crate::cohorts::{generate_cohorts, generate_ltv, generate_retention};
use crate::events::{generate_event_page, EventQuery};
use crate::forecast::{
    generate_cac_channels, generate_cac_trend, generate_forecast, generate_friction_score,
    generate_friction_trend, generate_optimization_roi,
};
use crate::funnel::generate_funnel;
use crate::personalization::{generate_personalization_metrics, generate_personalization_profiles};
use crate::predictions::{generate_abandonment_predictions, generate_intervention_stats, RiskLevel};
use crate::revenue::generate_revenue_series;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_usize(query: &HashMap<String, String>, name: &str, default: usize) -> InsightsResult<usize> {
    match query.get(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| InsightsError::InvalidQuery {
            name: name.to_string(),
            message: format!("expected a non-negative integer, got '{}'", raw),
        }),
    }
}

fn event_query(query: &HashMap<String, String>) -> InsightsResult<EventQuery> {
    Ok(EventQuery {
        page: parse_usize(query, "page", 1)?,
        limit: parse_usize(query, "limit", 50)?,
        event_type: query.get("event_type").cloned(),
        category: query.get("category").cloned(),
        step: query.get("step").cloned(),
    })
}

/// Dispatch one endpoint call and shape its JSON response.
///
/// Unknown endpoint keys log a warning and return `{}` rather than erroring;
/// a routing gap must not take the dashboard down.
pub fn handle(
    endpoint_key: &str,
    params: &GenerationParams,
    query: &HashMap<String, String>,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    debug!(endpoint = endpoint_key, account = %params.account_id, "dispatching demo-data endpoint");
    match endpoint_key {
        "metrics" => shape_metrics(params, clock, config),
        "revenue" => shape_revenue(params, clock, config),
        "funnel" => shape_funnel(params, clock, config),
        "analytics-payment" => shape_payment(params, clock, config),
        "analytics-shipping" => shape_shipping(params, clock, config),
        "analytics-devices" => shape_devices(params, clock, config),
        "analytics-browsers" => shape_browsers(params, clock, config),
        "analytics-geography" => shape_geography(params, clock, config),
        "analytics-coupons" => shape_coupons(params, clock, config),
        "analytics-micro-conversions" => shape_micro_conversions(params, clock, config),
        "analytics-ltv" => shape_ltv(params, clock, config),
        "analytics-cohorts" => shape_cohorts(params, clock, config),
        "analytics-retention" => shape_retention(params, clock, config),
        "analytics-friction" => shape_friction(params, clock, config),
        "analytics-cac" => shape_cac(params, clock, config),
        "analytics-optimization-roi" => shape_optimization_roi(params, clock, config),
        "analytics-segments" => shape_segments(params, clock, config),
        "analytics-forecast" => shape_forecast(params, clock, config),
        "boltx-predictions" => shape_predictions(params, clock, config),
        "boltx-interventions" => shape_interventions(params, clock, config),
        "personalization-profiles" => shape_personalization_profiles(params, clock, config),
        "personalization-metrics" => shape_personalization_metrics(params, clock, config),
        "analytics-events" => shape_events(params, query, clock, config),
        unknown => {
            warn!(endpoint = unknown, "unknown demo-data endpoint key");
            Ok(json!({}))
        }
    }
}

fn shape_metrics(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let base = generate_base_metrics(params, clock, config)?;
    Ok(json!({
        "totalSessions": base.total_sessions,
        "totalConversions": base.total_conversions,
        "totalRevenue": round2(base.total_revenue),
        "totalOrders": base.total_orders,
        "avgOrderValue": round2(base.avg_order_value),
        "conversionRate": round2(base.conversion_rate),
        "abandonmentRate": round2(base.abandonment_rate),
        "avgCheckoutTime": round2(base.avg_checkout_time),
        "revenueGrowth": round2(base.revenue_growth),
    }))
}

fn shape_revenue(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let series = generate_revenue_series(params, clock, config)?;
    let total: f64 = series.iter().map(|p| p.value).sum();
    Ok(json!({
        "series": series.iter().map(|p| json!({
            "date": p.date,
            "value": round2(p.value),
        })).collect::<Vec<_>>(),
        "totalRevenue": round2(total),
    }))
}

fn shape_funnel(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let funnel = generate_funnel(params, clock, config)?;
    Ok(json!({
        "cart": funnel.cart,
        "profile": funnel.profile,
        "shipping": funnel.shipping,
        "payment": funnel.payment,
        "confirmed": funnel.confirmed,
    }))
}

fn shape_payment(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_payment_methods(params, clock, config)?;
    Ok(json!({
        "methods": rows.iter().map(|r| json!({
            "method": r.method,
            "transactions": r.transactions,
            "revenue": round2(r.revenue),
            "percentage": round2(r.percentage),
            "avgOrderValue": round2(r.avg_order_value),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_shipping(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_shipping_methods(params, clock, config)?;
    Ok(json!({
        "methods": rows.iter().map(|r| json!({
            "method": r.method,
            "orders": r.orders,
            "revenue": round2(r.revenue),
            "percentage": round2(r.percentage),
            "avgDeliveryDays": round2(r.avg_delivery_days),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_devices(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_devices(params, clock, config)?;
    Ok(json!({
        "devices": rows.iter().map(|r| json!({
            "device": r.device,
            "sessions": r.sessions,
            "conversions": r.conversions,
            "revenue": round2(r.revenue),
            "percentage": round2(r.percentage),
            "conversionRate": round2(r.conversion_rate),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_browsers(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_browsers(params, clock, config)?;
    Ok(json!({
        "browsers": rows.iter().map(|r| json!({
            "browser": r.browser,
            "sessions": r.sessions,
            "conversions": r.conversions,
            "percentage": round2(r.percentage),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_geography(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_geography(params, clock, config)?;
    Ok(json!({
        "countries": rows.iter().map(|r| json!({
            "country": r.country,
            "sessions": r.sessions,
            "orders": r.orders,
            "revenue": round2(r.revenue),
            "percentage": round2(r.percentage),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_coupons(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_coupons(params, clock, config)?;
    Ok(json!({
        "coupons": rows.iter().map(|r| json!({
            "code": r.code,
            "redemptions": r.redemptions,
            "discountTotal": round2(r.discount_total),
            "revenue": round2(r.revenue),
            "percentage": round2(r.percentage),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_micro_conversions(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_micro_conversions(params, clock, config)?;
    Ok(json!({
        "microConversions": rows.iter().map(|r| json!({
            "name": r.name,
            "count": r.count,
            "rate": round2(r.rate),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_ltv(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let ltv = generate_ltv(params, clock, config)?;
    Ok(json!({
        "avgLtv": round2(ltv.avg_ltv),
        "medianLtv": round2(ltv.median_ltv),
        "topDecileLtv": round2(ltv.top_decile_ltv),
        "avgOrdersPerCustomer": round2(ltv.avg_orders_per_customer),
        "repeatPurchaseRate": round2(ltv.repeat_purchase_rate),
        "distribution": ltv.distribution.iter().map(|b| json!({
            "bucket": b.bucket,
            "customers": b.customers,
        })).collect::<Vec<_>>(),
    }))
}

fn shape_cohorts(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let cohorts = generate_cohorts(params, clock, config)?;
    Ok(json!({
        "cohorts": cohorts.iter().map(|c| json!({
            "cohort": c.cohort,
            "customers": c.customers,
            "retention": c.retention.iter().map(|r| round2(*r)).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_retention(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let curve = generate_retention(params, clock, config)?;
    Ok(json!({
        "curve": curve.iter().map(|p| json!({
            "period": p.period,
            "rate": round2(p.rate),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_friction(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let score = generate_friction_score(params, clock, config)?;
    let trend = generate_friction_trend(params, clock, config)?;
    Ok(json!({
        "score": round2(score.score),
        "level": score.level,
        "factors": score.factors.iter().map(|f| json!({
            "factor": f.factor,
            "impact": round2(f.impact),
        })).collect::<Vec<_>>(),
        "trend": trend.iter().map(|p| json!({
            "date": p.date,
            "value": round2(p.value),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_cac(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let channels = generate_cac_channels(params, clock, config)?;
    let trend = generate_cac_trend(params, clock, config)?;
    Ok(json!({
        "channels": channels.iter().map(|c| json!({
            "channel": c.channel,
            "spend": round2(c.spend),
            "acquisitions": c.acquisitions,
            "cac": round2(c.cac),
            "percentage": round2(c.percentage),
        })).collect::<Vec<_>>(),
        "trend": trend.iter().map(|p| json!({
            "date": p.date,
            "value": round2(p.value),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_optimization_roi(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_optimization_roi(params, clock, config)?;
    Ok(json!({
        "initiatives": rows.iter().map(|r| json!({
            "initiative": r.initiative,
            "cost": round2(r.cost),
            "incrementalRevenue": round2(r.incremental_revenue),
            "roi": r.roi.map(round2),
            "roiFormatted": r.roi_formatted,
        })).collect::<Vec<_>>(),
    }))
}

fn shape_segments(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_segments(params, clock, config)?;
    Ok(json!({
        "segments": rows.iter().map(|r| json!({
            "segment": r.segment,
            "customers": r.customers,
            "revenue": round2(r.revenue),
            "percentage": round2(r.percentage),
            "avgOrderValue": round2(r.avg_order_value),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_forecast(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let forecast = generate_forecast(params, clock, config)?;
    Ok(json!({
        "forecast": forecast.iter().map(|p| json!({
            "date": p.date,
            "predicted": round2(p.predicted),
            "lower": round2(p.lower),
            "upper": round2(p.upper),
            "confidence": round2(p.confidence),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_predictions(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let predictions = generate_abandonment_predictions(params, clock, config)?;
    let avg_risk = if predictions.is_empty() {
        0.0
    } else {
        predictions.iter().map(|p| p.risk_score).sum::<f64>() / predictions.len() as f64
    };
    let high_risk = predictions
        .iter()
        .filter(|p| matches!(p.risk_level, RiskLevel::High | RiskLevel::Critical))
        .count();
    Ok(json!({
        "predictions": predictions.iter().map(|p| json!({
            "sessionId": p.session_id,
            "riskScore": round2(p.risk_score),
            "riskLevel": p.risk_level.as_str(),
            "predictedStep": p.predicted_step,
            "recommendations": p.recommendations,
            "confidence": round2(p.confidence),
        })).collect::<Vec<_>>(),
        "summary": {
            "avgRiskScore": round2(avg_risk),
            "highRiskCount": high_risk,
        },
    }))
}

fn shape_interventions(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_intervention_stats(params, clock, config)?;
    Ok(json!({
        "interventions": rows.iter().map(|r| json!({
            "intervention": r.intervention,
            "applied": r.applied,
            "conversions": r.conversions,
            "conversionRate": round2(r.conversion_rate),
            "revenueRecovered": round2(r.revenue_recovered),
        })).collect::<Vec<_>>(),
    }))
}

fn shape_personalization_profiles(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let rows = generate_personalization_profiles(params, clock, config)?;
    Ok(json!({
        "profiles": rows.iter().map(|r| json!({
            "profile": r.profile,
            "sessions": r.sessions,
            "percentage": round2(r.percentage),
            "conversionRate": round2(r.conversion_rate),
            "avgOrderValue": round2(r.avg_order_value),
            "topRecommendation": r.top_recommendation,
        })).collect::<Vec<_>>(),
    }))
}

fn shape_personalization_metrics(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let metrics = generate_personalization_metrics(params, clock, config)?;
    Ok(json!({
        "personalizedSessions": metrics.personalized_sessions,
        "personalizationRate": round2(metrics.personalization_rate),
        "conversionUplift": round2(metrics.conversion_uplift),
        "aovUplift": round2(metrics.aov_uplift),
        "revenueUplift": round2(metrics.revenue_uplift),
        "activeProfiles": metrics.active_profiles,
    }))
}

fn shape_events(
    params: &GenerationParams,
    query: &HashMap<String, String>,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Value> {
    let parsed = event_query(query)?;
    let page = generate_event_page(params, &parsed, clock, config)?;
    Ok(json!({
        "events": page.events.iter().map(|e| json!({
            "id": e.id,
            "sessionId": e.session_id,
            "orderFormId": e.order_form_id,
            "eventType": e.event_type,
            "category": e.category.as_str(),
            "step": e.step,
            "metadata": e.metadata,
            "timestamp": e.timestamp.to_rfc3339(),
        })).collect::<Vec<_>>(),
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "totalFiltered": page.total_filtered,
        },
        "summary": {
            "totalEvents": page.summary.total_events,
            "eventsByCategory": page.summary.events_by_category,
            "topEventTypes": page.summary.top_event_types.iter().map(|t| json!({
                "eventType": t.event_type,
                "count": t.count,
            })).collect::<Vec<_>>(),
            "simulatedSessions": page.summary.simulated_sessions,
        },
    }))
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
        GenerationParams::new("acme", Period::Week)
    }

    #[test]
    fn test_unknown_endpoint_returns_empty_object() {
        let response = handle(
            "no-such-endpoint",
            &params(),
            &HashMap::new(),
            &clock(),
            &DemoConfig::default(),
        )
        .unwrap();
        assert_eq!(response, json!({}));
    }

    #[test]
    fn test_metrics_shape_and_rounding() {
        let response = handle(
            "metrics",
            &params(),
            &HashMap::new(),
            &clock(),
            &DemoConfig::default(),
        )
        .unwrap();
        let rate = response["conversionRate"].as_f64().unwrap();
        assert!(rate >= 0.0 && rate <= 15.0);
        // Two-decimal rounding is part of the contract.
        assert_eq!(round2(rate), rate);
        assert!(response["totalSessions"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_every_known_endpoint_responds() {
        let keys = [
            "metrics",
            "revenue",
            "funnel",
            "analytics-payment",
            "analytics-shipping",
            "analytics-devices",
            "analytics-browsers",
            "analytics-geography",
            "analytics-coupons",
            "analytics-micro-conversions",
            "analytics-ltv",
            "analytics-cohorts",
            "analytics-retention",
            "analytics-friction",
            "analytics-cac",
            "analytics-optimization-roi",
            "analytics-segments",
            "analytics-forecast",
            "boltx-predictions",
            "boltx-interventions",
            "personalization-profiles",
            "personalization-metrics",
            "analytics-events",
        ];
        for key in keys {
            let response = handle(
                key,
                &params(),
                &HashMap::new(),
                &clock(),
                &DemoConfig::default(),
            )
            .unwrap();
            assert!(response.is_object(), "{} returned a non-object", key);
            assert!(!response.as_object().unwrap().is_empty(), "{} was empty", key);
        }
    }

    #[test]
    fn test_bad_page_parameter_is_a_caller_error() {
        let mut query = HashMap::new();
        query.insert("page".to_string(), "not-a-number".to_string());
        let result = handle(
            "analytics-events",
            &params(),
            &query,
            &clock(),
            &DemoConfig::default(),
        );
        assert!(matches!(result, Err(InsightsError::InvalidQuery { .. })));
    }

    #[test]
    fn test_custom_period_without_dates_fails_closed() {
        let params = GenerationParams::new("acme", Period::Custom);
        let result = handle(
            "metrics",
            &params,
            &HashMap::new(),
            &clock(),
            &DemoConfig::default(),
        );
        assert!(matches!(result, Err(InsightsError::InvalidRange(_))));
    }

    #[test]
    fn test_responses_are_byte_identical_across_calls() {
        let config = DemoConfig::default();
        for key in ["metrics", "analytics-payment", "boltx-predictions", "analytics-events"] {
            let a = handle(key, &params(), &HashMap::new(), &clock(), &config).unwrap();
            let b = handle(key, &params(), &HashMap::new(), &clock(), &config).unwrap();
            assert_eq!(
                serde_json::to_vec(&a).unwrap(),
                serde_json::to_vec(&b).unwrap(),
                "{} not reproducible",
                key
            );
        }
    }
}
