//! Weighted breakdown generators — payment methods, shipping, devices,
//! browsers, geography, segments, coupons, and micro-conversions.
//!
//! All of these share one mechanism: a fixed weight table per entity, seeded
//! per-account-per-row jitter so tenants differ, then normalization so the
//! percentages sum to 100. The entity-specific structs keep each endpoint's
//! exact field contract.

use insights_core::{BaseMetrics, Clock, DemoConfig, GenerationParams, InsightsResult};

use serde::{Deserialize, Serialize};

use crate::base::generate_base_metrics;
use crate::seed::random_in_range;

/// One normalized row distributed off the base metrics.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeightedShare {
    pub name: &'static str,
    /// Fraction of the whole in `[0, 1]`; all shares sum to 1.
    pub share: f64,
}

/// Apply seeded jitter to a fixed weight table and normalize the result.
///
/// The jitter seed is `account:entity:row`, so each row is reproducible and
/// distinct per tenant without any shared state.
pub(crate) fn weighted_shares(
    account_id: &str,
    entity: &str,
    table: &[(&'static str, f64)],
) -> Vec<WeightedShare> {
    let jittered: Vec<(&'static str, f64)> = table
        .iter()
        .map(|(name, weight)| {
            let seed = format!("{}:{}:{}", account_id, entity, name);
            (*name, weight * random_in_range(&seed, 0.8, 1.2, 0))
        })
        .collect();

    let total: f64 = jittered.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return table
            .iter()
            .map(|(name, _)| WeightedShare { name, share: 0.0 })
            .collect();
    }

    jittered
        .into_iter()
        .map(|(name, weight)| WeightedShare {
            name,
            share: weight / total,
        })
        .collect()
}

const PAYMENT_METHODS: &[(&str, f64)] = &[
    ("credit_card", 0.46),
    ("pix", 0.22),
    ("debit_card", 0.14),
    ("digital_wallet", 0.10),
    ("boleto", 0.05),
    ("bank_transfer", 0.03),
];

const SHIPPING_METHODS: &[(&str, f64)] = &[
    ("standard", 0.52),
    ("express", 0.27),
    ("same_day", 0.09),
    ("pickup_point", 0.08),
    ("store_pickup", 0.04),
];

const DEVICES: &[(&str, f64)] = &[
    ("mobile", 0.58),
    ("desktop", 0.34),
    ("tablet", 0.08),
];

const BROWSERS: &[(&str, f64)] = &[
    ("chrome", 0.55),
    ("safari", 0.22),
    ("edge", 0.09),
    ("firefox", 0.08),
    ("samsung_internet", 0.06),
];

const GEOGRAPHY: &[(&str, f64)] = &[
    ("Brazil", 0.38),
    ("United States", 0.24),
    ("Mexico", 0.12),
    ("Argentina", 0.09),
    ("Colombia", 0.07),
    ("Chile", 0.06),
    ("Portugal", 0.04),
];

const SEGMENTS: &[(&str, f64)] = &[
    ("new_customers", 0.34),
    ("returning_customers", 0.28),
    ("loyal_customers", 0.18),
    ("at_risk", 0.12),
    ("vip", 0.08),
];

const COUPONS: &[(&str, f64)] = &[
    ("WELCOME10", 0.35),
    ("FREESHIP", 0.27),
    ("SAVE20", 0.18),
    ("FLASH15", 0.12),
    ("VIP25", 0.08),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodStats {
    pub method: String,
    pub transactions: u64,
    pub revenue: f64,
    pub percentage: f64,
    pub avg_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethodStats {
    pub method: String,
    pub orders: u64,
    pub revenue: f64,
    pub percentage: f64,
    pub avg_delivery_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub device: String,
    pub sessions: u64,
    pub conversions: u64,
    pub revenue: f64,
    pub percentage: f64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserStats {
    pub browser: String,
    pub sessions: u64,
    pub conversions: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographyStats {
    pub country: String,
    pub sessions: u64,
    pub orders: u64,
    pub revenue: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub segment: String,
    pub customers: u64,
    pub revenue: f64,
    pub percentage: f64,
    pub avg_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponStats {
    pub code: String,
    pub redemptions: u64,
    pub discount_total: f64,
    pub revenue: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroConversionStats {
    pub name: String,
    pub count: u64,
    /// Percent of sessions performing the action.
    pub rate: f64,
}

fn base_for(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<BaseMetrics> {
    generate_base_metrics(params, clock, config)
}

pub fn generate_payment_methods(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<PaymentMethodStats>> {
    let base = base_for(params, clock, config)?;
    let rows = weighted_shares(&params.account_id, "payment", PAYMENT_METHODS)
        .into_iter()
        .map(|row| {
            let transactions = (base.total_orders as f64 * row.share).round() as u64;
            let revenue = base.total_revenue * row.share;
            PaymentMethodStats {
                method: row.name.to_string(),
                transactions,
                revenue,
                percentage: row.share * 100.0,
                avg_order_value: if transactions > 0 {
                    revenue / transactions as f64
                } else {
                    0.0
                },
            }
        })
        .collect();
    Ok(rows)
}

pub fn generate_shipping_methods(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<ShippingMethodStats>> {
    let base = base_for(params, clock, config)?;
    let rows = weighted_shares(&params.account_id, "shipping", SHIPPING_METHODS)
        .into_iter()
        .enumerate()
        .map(|(i, row)| ShippingMethodStats {
            method: row.name.to_string(),
            orders: (base.total_orders as f64 * row.share).round() as u64,
            revenue: base.total_revenue * row.share,
            percentage: row.share * 100.0,
            avg_delivery_days: random_in_range(
                &format!("{}:shipping:{}:days", params.account_id, row.name),
                if i == 0 { 3.0 } else { 0.5 },
                if i == 0 { 7.0 } else { 4.0 },
                0,
            ),
        })
        .collect();
    Ok(rows)
}

pub fn generate_devices(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<DeviceStats>> {
    let base = base_for(params, clock, config)?;
    let rows = weighted_shares(&params.account_id, "device", DEVICES)
        .into_iter()
        .map(|row| {
            let sessions = (base.total_sessions as f64 * row.share).round() as u64;
            let conversions = (base.total_conversions as f64 * row.share).round() as u64;
            DeviceStats {
                device: row.name.to_string(),
                sessions,
                conversions,
                revenue: base.total_revenue * row.share,
                percentage: row.share * 100.0,
                conversion_rate: if sessions > 0 {
                    conversions as f64 / sessions as f64 * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();
    Ok(rows)
}

pub fn generate_browsers(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<BrowserStats>> {
    let base = base_for(params, clock, config)?;
    let rows = weighted_shares(&params.account_id, "browser", BROWSERS)
        .into_iter()
        .map(|row| BrowserStats {
            browser: row.name.to_string(),
            sessions: (base.total_sessions as f64 * row.share).round() as u64,
            conversions: (base.total_conversions as f64 * row.share).round() as u64,
            percentage: row.share * 100.0,
        })
        .collect();
    Ok(rows)
}

pub fn generate_geography(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<GeographyStats>> {
    let base = base_for(params, clock, config)?;
    let rows = weighted_shares(&params.account_id, "geography", GEOGRAPHY)
        .into_iter()
        .map(|row| GeographyStats {
            country: row.name.to_string(),
            sessions: (base.total_sessions as f64 * row.share).round() as u64,
            orders: (base.total_orders as f64 * row.share).round() as u64,
            revenue: base.total_revenue * row.share,
            percentage: row.share * 100.0,
        })
        .collect();
    Ok(rows)
}

pub fn generate_segments(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<SegmentStats>> {
    let base = base_for(params, clock, config)?;
    let rows = weighted_shares(&params.account_id, "segment", SEGMENTS)
        .into_iter()
        .map(|row| {
            let customers = (base.total_conversions as f64 * row.share).round() as u64;
            let revenue = base.total_revenue * row.share;
            // VIP and loyal segments skew to larger baskets.
            let aov_multiplier = match row.name {
                "vip" => 1.8,
                "loyal_customers" => 1.3,
                "at_risk" => 0.8,
                _ => 1.0,
            };
            SegmentStats {
                segment: row.name.to_string(),
                customers,
                revenue,
                percentage: row.share * 100.0,
                avg_order_value: base.avg_order_value * aov_multiplier,
            }
        })
        .collect();
    Ok(rows)
}

pub fn generate_coupons(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<CouponStats>> {
    let base = base_for(params, clock, config)?;
    // Roughly a quarter of orders carry a coupon.
    let couponed_orders = base.total_orders as f64
        * random_in_range(&format!("{}:coupon_share", params.account_id), 0.18, 0.32, 0);
    let rows = weighted_shares(&params.account_id, "coupon", COUPONS)
        .into_iter()
        .map(|row| {
            let redemptions = (couponed_orders * row.share).round() as u64;
            let revenue = base.avg_order_value * redemptions as f64;
            let discount_rate = random_in_range(
                &format!("{}:coupon:{}:discount", params.account_id, row.name),
                0.08,
                0.25,
                0,
            );
            CouponStats {
                code: row.name.to_string(),
                redemptions,
                discount_total: revenue * discount_rate,
                revenue,
                percentage: row.share * 100.0,
            }
        })
        .collect();
    Ok(rows)
}

pub fn generate_micro_conversions(
    params: &GenerationParams,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<Vec<MicroConversionStats>> {
    let base = base_for(params, clock, config)?;
    let actions: &[(&str, f64, f64)] = &[
        ("newsletter_signup", 4.0, 9.0),
        ("account_created", 6.0, 12.0),
        ("wishlist_add", 10.0, 18.0),
        ("coupon_applied", 12.0, 22.0),
        ("address_autofill_used", 25.0, 45.0),
    ];
    let rows = actions
        .iter()
        .map(|(name, min_rate, max_rate)| {
            let rate = random_in_range(
                &format!("{}:micro:{}", params.account_id, name),
                *min_rate,
                *max_rate,
                0,
            );
            MicroConversionStats {
                name: name.to_string(),
                count: (base.total_sessions as f64 * rate / 100.0).round() as u64,
                rate,
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
    fn test_payment_percentages_sum_to_hundred() {
        let rows = generate_payment_methods(&params(), &clock(), &DemoConfig::default()).unwrap();
        let total: f64 = rows.iter().map(|r| r.percentage).sum();
        assert!((total - 100.0).abs() < 0.1, "sum was {}", total);
    }

    #[test]
    fn test_all_breakdowns_normalize() {
        let config = DemoConfig::default();
        let clock = clock();
        let sums = [
            generate_shipping_methods(&params(), &clock, &config)
                .unwrap()
                .iter()
                .map(|r| r.percentage)
                .sum::<f64>(),
            generate_devices(&params(), &clock, &config)
                .unwrap()
                .iter()
                .map(|r| r.percentage)
                .sum::<f64>(),
            generate_browsers(&params(), &clock, &config)
                .unwrap()
                .iter()
                .map(|r| r.percentage)
                .sum::<f64>(),
            generate_geography(&params(), &clock, &config)
                .unwrap()
                .iter()
                .map(|r| r.percentage)
                .sum::<f64>(),
            generate_segments(&params(), &clock, &config)
                .unwrap()
                .iter()
                .map(|r| r.percentage)
                .sum::<f64>(),
            generate_coupons(&params(), &clock, &config)
                .unwrap()
                .iter()
                .map(|r| r.percentage)
                .sum::<f64>(),
        ];
        for sum in sums {
            assert!((sum - 100.0).abs() < 0.1, "sum was {}", sum);
        }
    }

    #[test]
    fn test_rows_are_distinct_per_account() {
        let config = DemoConfig::default();
        let acme = generate_payment_methods(&params(), &clock(), &config).unwrap();
        let globex = generate_payment_methods(
            &GenerationParams::new("globex", Period::Week),
            &clock(),
            &config,
        )
        .unwrap();
        assert_ne!(acme[0].percentage, globex[0].percentage);
    }

    #[test]
    fn test_deterministic() {
        let config = DemoConfig::default();
        let a = generate_geography(&params(), &clock(), &config).unwrap();
        let b = generate_geography(&params(), &clock(), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_device_conversion_rate_is_bounded() {
        let rows = generate_devices(&params(), &clock(), &DemoConfig::default()).unwrap();
        for row in rows {
            assert!(row.conversion_rate >= 0.0 && row.conversion_rate <= 100.0);
            assert!(row.conversions <= row.sessions);
        }
    }

    #[test]
    fn test_micro_conversion_counts_follow_rates() {
        let rows = generate_micro_conversions(&params(), &clock(), &DemoConfig::default()).unwrap();
        for row in rows {
            assert!(row.rate > 0.0 && row.rate < 100.0);
            assert!(row.count > 0);
        }
    }
}
