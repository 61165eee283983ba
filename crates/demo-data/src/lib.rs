//! Deterministic synthetic analytics engine for demo-mode tenants.
//!
//! Every generator is a pure function of `GenerationParams`, an injected
//! clock, and fixed configuration: no RNG instances, no caches, no I/O.
//! Identical inputs always produce identical JSON, concurrent calls are
//! inherently safe, and the event simulator bounds its work regardless of
//! the requested page size.

pub mod base;
pub mod breakdown;
pub mod cohorts;
pub mod dispatch;
pub mod events;
pub mod forecast;
pub mod funnel;
pub mod personalization;
pub mod predictions;
pub mod revenue;
pub mod seed;
pub mod timerange;

pub use dispatch::handle;
pub use timerange::resolve_range;
