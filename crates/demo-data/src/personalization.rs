//! Personalization profile and aggregate-metric generators.

use insights_core::{Clock, DemoConfig, GenerationParams, InsightsResult};

use serde::{Deserialize, Serialize};

use crate::base::generate_base_metrics;
use crate::breakdown::weighted_shares;
use crate::seed::random_in_range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationProfile {
    pub profile: String,
    pub sessions: u64,
    pub percentage: f64,
    pub conversion_rate: f64,
    pub avg_order_value: f64,
    pub top_recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationMetrics {
    pub personalized_sessions: u64,
    /// Percent of all sessions that received personalization.
    pub personalization_rate: f64,
    pub conversion_uplift: f64,
    pub aov_uplift: f64,
    pub revenue_uplift: f64,
    pub active_profiles: u64,
}

const PROFILES: &[(&str, f64)] = &[
    ("price_sensitive", 0.30),
    ("brand_loyal", 0.22),
    ("impulse_buyer", 0.19),
    ("researcher", 0.17),
    ("gift_shopper", 0.12),
];

fn top_recommendation_for(profile: &str) -> &'static str {
    match profile {
        "price_sensitive" => "show_discount_banner",
        "brand_loyal" => "feature_preferred_brands",
        "impulse_buyer" => "one_click_upsell",
        "researcher" => "surface_detailed_reviews",
        _ => "suggest_gift_wrapping",
    }
}

pub fn generate_personalization_profiles(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<PersonalizationProfile>> {
    let base = generate_base_metrics(params, clock, config)?;
    let rows = weighted_shares(&params.account_id, "profile", PROFILES)
        .into_iter()
        .map(|row| {
            let seed = format!("{}:profile:{}", params.account_id, row.name);
            // Each profile converts around the account baseline, within the
            // same global cap.
            let conversion_rate = (base.conversion_rate
                * random_in_range(&seed, 0.7, 1.3, 0))
            .min(15.0);
            PersonalizationProfile {
                profile: row.name.to_string(),
                sessions: (base.total_sessions as f64 * row.share).round() as u64,
                percentage: row.share * 100.0,
                conversion_rate,
                avg_order_value: base.avg_order_value * random_in_range(&seed, 0.8, 1.4, 1),
                top_recommendation: top_recommendation_for(row.name).to_string(),
            }
        })
        .collect();
    Ok(rows)
}

pub fn generate_personalization_metrics(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<PersonalizationMetrics> {
    let base = generate_base_metrics(params, clock, config)?;
    let seed = format!("{}:personalization", params.account_id);
    let rate = random_in_range(&seed, 35.0, 75.0, 0);

    Ok(PersonalizationMetrics {
        personalized_sessions: (base.total_sessions as f64 * rate / 100.0).round() as u64,
        personalization_rate: rate,
        conversion_uplift: random_in_range(&seed, 4.0, 18.0, 1),
        aov_uplift: random_in_range(&seed, 2.0, 11.0, 2),
        revenue_uplift: random_in_range(&seed, 3.0, 15.0, 3),
        active_profiles: PROFILES.len() as u64,
    })
}
