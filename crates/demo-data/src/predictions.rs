//! Abandonment-risk predictions and intervention effectiveness.

use insights_core::{Clock, DemoConfig, GenerationParams, InsightsResult};

use serde::{Deserialize, Serialize};

use crate::base::generate_base_metrics;
use crate::seed::{consistent_id, pick, random_in_range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Deterministic threshold bucketing of a `[0, 100]` score.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 40.0 => RiskLevel::Low,
            s if s < 65.0 => RiskLevel::Medium,
            s if s < 85.0 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbandonmentPrediction {
    pub session_id: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub predicted_step: String,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionStats {
    pub intervention: String,
    pub applied: u64,
    pub conversions: u64,
    pub conversion_rate: f64,
    pub revenue_recovered: f64,
}

const CHECKOUT_STEPS: &[&str] = &["cart", "profile", "shipping", "payment"];

const LOW_RISK_ACTIONS: &[&str] = &["monitor_session", "show_trust_badges"];
const MEDIUM_RISK_ACTIONS: &[&str] = &[
    "show_trust_badges",
    "highlight_free_returns",
    "surface_support_chat",
];
const HIGH_RISK_ACTIONS: &[&str] = &[
    "offer_free_shipping",
    "surface_support_chat",
    "simplify_payment_form",
];
const CRITICAL_RISK_ACTIONS: &[&str] = &[
    "offer_discount",
    "offer_free_shipping",
    "trigger_exit_intent_modal",
];

fn recommendations_for(level: RiskLevel, seed: &str) -> Vec<String> {
    let pool = match level {
        RiskLevel::Low => LOW_RISK_ACTIONS,
        RiskLevel::Medium => MEDIUM_RISK_ACTIONS,
        RiskLevel::High => HIGH_RISK_ACTIONS,
        RiskLevel::Critical => CRITICAL_RISK_ACTIONS,
    };
    // Primary action plus one seeded alternate, deduplicated.
    let primary = pool[0].to_string();
    let alternate = pick(seed, 1, pool).to_string();
    if alternate == primary {
        vec![primary]
    } else {
        vec![primary, alternate]
    }
}

const PREDICTION_COUNT: u64 = 20;

/// Risk predictions for a fixed-size slate of currently at-risk sessions.
pub fn generate_abandonment_predictions(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<AbandonmentPrediction>> {
    let base = generate_base_metrics(params, clock, config)?;
    if base.total_sessions == 0 {
        return Ok(Vec::new());
    }

    let predictions = (0..PREDICTION_COUNT)
        .map(|i| {
            let seed = format!("{}:prediction:{}", params.account_id, i);
            let risk_score = random_in_range(&seed, 0.0, 100.0, 0);
            let risk_level = RiskLevel::from_score(risk_score);
            AbandonmentPrediction {
                session_id: consistent_id(&params.account_id, i, "sess"),
                risk_score,
                risk_level,
                predicted_step: pick(&seed, 2, CHECKOUT_STEPS).to_string(),
                recommendations: recommendations_for(risk_level, &seed),
                confidence: random_in_range(&seed, 62.0, 96.0, 3),
            }
        })
        .collect();
    Ok(predictions)
}

const INTERVENTIONS: &[(&str, f64)] = &[
    ("discount_offer", 0.30),
    ("free_shipping", 0.26),
    ("exit_intent_modal", 0.20),
    ("email_reminder", 0.15),
    ("live_chat_prompt", 0.09),
];

/// Synthetic outcomes of retention interventions applied to at-risk sessions.
pub fn generate_intervention_stats(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<InterventionStats>> {
    let base = generate_base_metrics(params, clock, config)?;
    let abandoned = base.total_sessions.saturating_sub(base.total_conversions);
    // Interventions reach a seeded slice of abandoning sessions.
    let reach = random_in_range(&format!("{}:intervention_reach", params.account_id), 0.1, 0.25, 0);
    let reached = abandoned as f64 * reach;

    let rows = INTERVENTIONS
        .iter()
        .map(|(name, share)| {
            let seed = format!("{}:intervention:{}", params.account_id, name);
            let applied = (reached * share * random_in_range(&seed, 0.85, 1.15, 0)).round() as u64;
            let recovery_rate = random_in_range(&seed, 0.05, 0.22, 1);
            let conversions = (applied as f64 * recovery_rate).round() as u64;
            InterventionStats {
                intervention: (*name).to_string(),
                applied,
                conversions,
                conversion_rate: if applied > 0 {
                    conversions as f64 / applied as f64 * 100.0
                } else {
                    0.0
                },
                revenue_recovered: conversions as f64 * base.avg_order_value,
            }
        })
        .collect();
    Ok(rows)
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
    fn test_risk_bucketing_thresholds() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(39.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(40.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(64.9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(65.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(84.9), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(85.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::Critical);
    }

    #[test]
    fn test_predictions_respect_bounds() {
        let predictions =
            generate_abandonment_predictions(&params(), &clock(), &DemoConfig::default()).unwrap();
        assert_eq!(predictions.len(), PREDICTION_COUNT as usize);
        for p in &predictions {
            assert!(p.risk_score >= 0.0 && p.risk_score <= 100.0);
            assert_eq!(p.risk_level, RiskLevel::from_score(p.risk_score));
            assert!(!p.recommendations.is_empty());
            assert!(CHECKOUT_STEPS.contains(&p.predicted_step.as_str()));
        }
    }

    #[test]
    fn test_prediction_ids_are_unique_and_stable() {
        let config = DemoConfig::default();
        let a = generate_abandonment_predictions(&params(), &clock(), &config).unwrap();
        let b = generate_abandonment_predictions(&params(), &clock(), &config).unwrap();
        assert_eq!(a, b);
        let mut ids: Vec<_> = a.iter().map(|p| p.session_id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), a.len());
    }

    #[test]
    fn test_interventions_recover_a_fraction() {
        let rows = generate_intervention_stats(&params(), &clock(), &DemoConfig::default()).unwrap();
        assert_eq!(rows.len(), INTERVENTIONS.len());
        for row in rows {
            assert!(row.conversions <= row.applied);
            assert!(row.conversion_rate <= 100.0);
            assert!(row.revenue_recovered >= 0.0);
        }
    }
}
