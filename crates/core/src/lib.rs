//! Checkout Insights — shared foundation: configuration, errors, the
//! injectable clock, and the generation parameter types consumed by the
//! demo-data engine.

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::DemoConfig;
pub use error::{InsightsError, InsightsResult};
pub use types::{BaseMetrics, GenerationParams, Granularity, Period, TimeRange};
