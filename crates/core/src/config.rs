use serde::Deserialize;

/// Demo-data engine configuration. Loaded from environment variables with
/// the prefix `CHECKOUT_INSIGHTS__`.
///
/// Every knob has a default; a fresh deployment generates plausible numbers
/// with no configuration at all.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Notional annual revenue a demo tenant is scaled around, in dollars.
    #[serde(default = "default_annual_revenue")]
    pub annual_revenue: f64,
    /// Assumed average order value used to back-derive orders from revenue.
    #[serde(default = "default_avg_order_value")]
    pub avg_order_value: f64,
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

/// Seeded growth and conversion bounds for the base metrics generator.
#[derive(Debug, Clone, Deserialize)]
pub struct GrowthConfig {
    /// Lower bound of the per-account monthly revenue growth rate.
    #[serde(default = "default_monthly_growth_min")]
    pub monthly_growth_min: f64,
    /// Upper bound of the per-account monthly revenue growth rate.
    #[serde(default = "default_monthly_growth_max")]
    pub monthly_growth_max: f64,
    /// Lower bound of the seeded base conversion rate, in percent.
    #[serde(default = "default_conversion_min")]
    pub conversion_min: f64,
    /// Upper bound of the seeded base conversion rate, in percent.
    #[serde(default = "default_conversion_max")]
    pub conversion_max: f64,
    /// Conversion-rate improvement per elapsed month, in percentage points.
    #[serde(default = "default_conversion_improvement_per_month")]
    pub conversion_improvement_per_month: f64,
    /// Hard cap on the conversion rate, in percent.
    #[serde(default = "default_conversion_cap")]
    pub conversion_cap: f64,
}

/// Bounds for the checkout-session event simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    /// Hard cap on sessions materialized per call, whatever the page size.
    #[serde(default = "default_session_cap")]
    pub session_cap: usize,
    /// Minimum simulated sessions, so small pages still get a stable sample.
    #[serde(default = "default_min_sessions")]
    pub min_sessions: usize,
    /// Expected events emitted per session, used to size the sample for a page.
    #[serde(default = "default_events_per_session_estimate")]
    pub events_per_session_estimate: usize,
    /// Fraction of events expected to survive endpoint filters.
    #[serde(default = "default_filter_pass_rate")]
    pub filter_pass_rate: f64,
}

fn default_annual_revenue() -> f64 {
    2_400_000.0
}
fn default_avg_order_value() -> f64 {
    85.0
}
fn default_monthly_growth_min() -> f64 {
    0.02
}
fn default_monthly_growth_max() -> f64 {
    0.08
}
fn default_conversion_min() -> f64 {
    8.0
}
fn default_conversion_max() -> f64 {
    12.0
}
fn default_conversion_improvement_per_month() -> f64 {
    0.1
}
fn default_conversion_cap() -> f64 {
    15.0
}
fn default_session_cap() -> usize {
    500
}
fn default_min_sessions() -> usize {
    50
}
fn default_events_per_session_estimate() -> usize {
    10
}
fn default_filter_pass_rate() -> f64 {
    0.3
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            monthly_growth_min: default_monthly_growth_min(),
            monthly_growth_max: default_monthly_growth_max(),
            conversion_min: default_conversion_min(),
            conversion_max: default_conversion_max(),
            conversion_improvement_per_month: default_conversion_improvement_per_month(),
            conversion_cap: default_conversion_cap(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            session_cap: default_session_cap(),
            min_sessions: default_min_sessions(),
            events_per_session_estimate: default_events_per_session_estimate(),
            filter_pass_rate: default_filter_pass_rate(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            annual_revenue: default_annual_revenue(),
            avg_order_value: default_avg_order_value(),
            growth: GrowthConfig::default(),
            simulator: SimulatorConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CHECKOUT_INSIGHTS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
