//! Checkout funnel generator.

use insights_core::{Clock, DemoConfig, GenerationParams, InsightsResult};

use serde::{Deserialize, Serialize};

use crate::base::generate_base_metrics;

/// Session counts through the checkout steps, monotonically non-increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Funnel {
    pub cart: u64,
    pub profile: u64,
    pub shipping: u64,
    pub payment: u64,
    pub confirmed: u64,
}

const CART_TO_PROFILE: f64 = 0.85;
const PROFILE_TO_SHIPPING: f64 = 0.75;
const SHIPPING_TO_PAYMENT: f64 = 0.65;

/// Cascade fixed conversion ratios off total sessions.
///
/// `confirmed` is pinned to the base metrics' conversion count rather than
/// derived from the cascade, so the funnel's bottom always matches the
/// headline conversions reported by every other endpoint.
pub fn generate_funnel(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Funnel> {
    let base = generate_base_metrics(params, clock, config)?;

    let cart = base.total_sessions;
    let profile = (cart as f64 * CART_TO_PROFILE).round() as u64;
    let shipping = (profile as f64 * PROFILE_TO_SHIPPING).round() as u64;
    let payment = (shipping as f64 * SHIPPING_TO_PAYMENT).round() as u64;
    let confirmed = base.total_conversions.min(payment);

    Ok(Funnel {
        cart,
        profile,
        shipping,
        payment,
        confirmed,
    })
}
