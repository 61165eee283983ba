//! Checkout-session event simulator.
//!
//! Synthesizes a bounded population of fake checkout sessions and their
//! ordered event streams. The number of sessions materialized is derived
//! from the requested page but hard-capped, so an adversarially large
//! `page`/`limit` still costs O(cap) work and memory. Summary statistics are
//! computed over the simulated sample and linearly extrapolated by
//! `total_sessions / simulated_sessions`, keeping them on the same order of
//! magnitude as the notional population without materializing it.

use std::collections::BTreeMap;

use insights_core::{Clock, DemoConfig, GenerationParams, InsightsResult, TimeRange};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::base::generate_base_metrics;
use crate::seed::{chance, consistent_id, int_in_range, random_in_range};
use crate::timerange::resolve_range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    UserAction,
    ApiCall,
    Metric,
    Error,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::UserAction => "user_action",
            EventCategory::ApiCall => "api_call",
            EventCategory::Metric => "metric",
            EventCategory::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedEvent {
    pub id: String,
    pub session_id: String,
    pub order_form_id: String,
    pub event_type: String,
    pub category: EventCategory,
    pub step: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Filters and paging accepted by the events endpoint.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub page: usize,
    pub limit: usize,
    pub event_type: Option<String>,
    pub category: Option<String>,
    pub step: Option<String>,
}

impl EventQuery {
    pub fn has_filters(&self) -> bool {
        self.event_type.is_some() || self.category.is_some() || self.step.is_some()
    }

    fn matches(&self, event: &SimulatedEvent) -> bool {
        if let Some(wanted) = &self.event_type {
            if &event.event_type != wanted {
                return false;
            }
        }
        if let Some(wanted) = &self.category {
            if event.category.as_str() != wanted {
                return false;
            }
        }
        if let Some(wanted) = &self.step {
            if event.step.as_deref() != Some(wanted.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTypeCount {
    pub event_type: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Extrapolated to the notional session population.
    pub total_events: u64,
    pub events_by_category: BTreeMap<String, u64>,
    pub top_event_types: Vec<EventTypeCount>,
    pub simulated_sessions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<SimulatedEvent>,
    pub page: usize,
    pub limit: usize,
    pub total_filtered: u64,
    pub summary: EventSummary,
}

const STEPS: &[&str] = &["cart", "profile", "shipping", "payment"];

/// Completion probability per step; mirrors the funnel cascade.
const STEP_COMPLETION: &[f64] = &[0.85, 0.75, 0.65, 0.9];

/// How many sessions to materialize for this query.
///
/// `needed` converts the requested page depth into sessions via the expected
/// events-per-session, scaled up when filters are present since filters are
/// expected to discard roughly 70% of events. The result is clamped between
/// the stable minimum sample and the hard cap.
fn sample_size(query: &EventQuery, config: &DemoConfig) -> usize {
    let sim = &config.simulator;
    let requested_events = query.page.saturating_mul(query.limit);
    let mut needed =
        (requested_events as f64 / sim.events_per_session_estimate.max(1) as f64).ceil();
    if query.has_filters() {
        needed = (needed / sim.filter_pass_rate).ceil();
    }
    (needed as usize).clamp(sim.min_sessions, sim.session_cap)
}

/// Per-session emitter: one synthetic clock, advanced by a seeded duration at
/// every transition.
struct SessionWalk {
    seed: String,
    session_id: String,
    order_form_id: String,
    now: DateTime<Utc>,
    counter: u64,
    events: Vec<SimulatedEvent>,
}

impl SessionWalk {
    fn new(account_id: &str, index: u64, range: &TimeRange) -> Self {
        let seed = format!("{}:session:{}", account_id, index);
        let span_secs = (range.end - range.start).num_seconds().max(1);
        // Sessions start somewhere in the first 95% of the window, leaving
        // room for the walk itself.
        let offset = (random_in_range(&seed, 0.0, 0.95, 0) * span_secs as f64) as i64;
        Self {
            session_id: consistent_id(account_id, index, "sess"),
            order_form_id: consistent_id(account_id, index, "form"),
            now: range.start + Duration::seconds(offset),
            counter: 0,
            events: Vec::with_capacity(16),
            seed,
        }
    }

    fn advance(&mut self) {
        let secs = int_in_range(&self.seed, 5, 90, 1000 + self.counter);
        self.now += Duration::seconds(secs);
    }

    fn emit(
        &mut self,
        event_type: &str,
        category: EventCategory,
        step: Option<&str>,
        metadata: Option<serde_json::Value>,
    ) {
        self.events.push(SimulatedEvent {
            id: consistent_id(&self.session_id, self.counter, "evt"),
            session_id: self.session_id.clone(),
            order_form_id: self.order_form_id.clone(),
            event_type: event_type.to_string(),
            category,
            step: step.map(str::to_string),
            metadata,
            timestamp: self.now,
        });
        self.counter += 1;
        self.advance();
    }

    fn chance(&self, salt: u64, probability: f64) -> bool {
        chance(&self.seed, salt, probability)
    }

    /// Walk the fixed checkout state graph.
    fn run(mut self) -> Vec<SimulatedEvent> {
        self.emit("checkout_started", EventCategory::UserAction, None, None);

        let mut completed_all_steps = true;
        for (i, step) in STEPS.iter().copied().enumerate() {
            self.emit("step_viewed", EventCategory::UserAction, Some(step), None);
            if !self.chance(10 + i as u64, STEP_COMPLETION[i]) {
                completed_all_steps = false;
                break;
            }
            self.emit("step_completed", EventCategory::UserAction, Some(step), None);
        }

        if completed_all_steps && self.chance(20, 0.92) {
            self.emit(
                "payment_method_selected",
                EventCategory::UserAction,
                Some("payment"),
                None,
            );
            if self.chance(21, 0.88) {
                self.emit(
                    "payment_submitted",
                    EventCategory::ApiCall,
                    Some("payment"),
                    None,
                );
                if self.chance(22, 0.9) {
                    self.emit(
                        "payment_completed",
                        EventCategory::ApiCall,
                        Some("payment"),
                        None,
                    );
                    self.emit("order_confirmed", EventCategory::UserAction, None, None);
                } else {
                    let code = int_in_range(&self.seed, 4000, 4009, 23);
                    self.emit(
                        "error_occurred",
                        EventCategory::Error,
                        Some("payment"),
                        Some(serde_json::json!({ "errorCode": code })),
                    );
                }
            }
        }

        // Independent of the checkout walk: an API call pair and a metric
        // sample, each behind their own seeded coin.
        if self.chance(30, 0.6) {
            self.emit(
                "api_call_started",
                EventCategory::ApiCall,
                None,
                Some(serde_json::json!({ "endpoint": "/api/checkout/order-form" })),
            );
            self.emit(
                "api_call_completed",
                EventCategory::ApiCall,
                None,
                Some(serde_json::json!({ "endpoint": "/api/checkout/order-form" })),
            );
        }
        if self.chance(31, 0.5) {
            let duration = int_in_range(&self.seed, 800, 9500, 32);
            self.emit(
                "checkout_time_recorded",
                EventCategory::Metric,
                None,
                Some(serde_json::json!({ "durationMs": duration })),
            );
        }

        self.events
    }
}

/// Simulate, filter, sort, and slice one page of checkout events.
pub fn generate_event_page(
    params: &GenerationParams,
    query: &EventQuery,
    clock: &dyn Clock,
    config: &DemoConfig,
) -> InsightsResult<EventPage> {
    let range = resolve_range(params.period, params.start_date, params.end_date, clock)?;
    let base = generate_base_metrics(params, clock, config)?;

    let simulated_sessions = sample_size(query, config);
    let mut all_events: Vec<SimulatedEvent> = Vec::with_capacity(simulated_sessions * 10);
    for index in 0..simulated_sessions as u64 {
        all_events.extend(SessionWalk::new(&params.account_id, index, &range).run());
    }

    let summary = summarize(&all_events, base.total_sessions, simulated_sessions);

    let mut filtered: Vec<SimulatedEvent> = all_events
        .into_iter()
        .filter(|e| query.matches(e))
        .collect();
    // Newest first; id breaks timestamp ties so paging is total-ordered.
    filtered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

    let total_filtered = filtered.len() as u64;
    let page = query.page.max(1);
    let offset = (page - 1).saturating_mul(query.limit);
    let events: Vec<SimulatedEvent> = filtered.into_iter().skip(offset).take(query.limit).collect();

    Ok(EventPage {
        events,
        page,
        limit: query.limit,
        total_filtered,
        summary,
    })
}

fn summarize(
    events: &[SimulatedEvent],
    total_sessions: u64,
    simulated_sessions: usize,
) -> EventSummary {
    let sample_ratio = if simulated_sessions > 0 {
        total_sessions as f64 / simulated_sessions as f64
    } else {
        0.0
    };

    let mut by_category: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_type: BTreeMap<String, u64> = BTreeMap::new();
    for event in events {
        *by_category
            .entry(event.category.as_str().to_string())
            .or_insert(0) += 1;
        *by_type.entry(event.event_type.clone()).or_insert(0) += 1;
    }

    let events_by_category = by_category
        .into_iter()
        .map(|(category, count)| (category, (count as f64 * sample_ratio).round() as u64))
        .collect();

    let mut top_event_types: Vec<EventTypeCount> = by_type
        .into_iter()
        .map(|(event_type, count)| EventTypeCount {
            event_type,
            count: (count as f64 * sample_ratio).round() as u64,
        })
        .collect();
    top_event_types.sort_by(|a, b| b.count.cmp(&a.count).then(a.event_type.cmp(&b.event_type)));
    top_event_types.truncate(5);

    EventSummary {
        total_events: (events.len() as f64 * sample_ratio).round() as u64,
        events_by_category,
        top_event_types,
        simulated_sessions: simulated_sessions as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use insights_core::{FixedClock, Period};

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap())
    }

    fn params() -> GenerationParams {
        GenerationParams::new("acme", Period::Week)
    }

    fn query(page: usize, limit: usize) -> EventQuery {
        EventQuery {
            page,
            limit,
            ..EventQuery::default()
        }
    }

    #[test]
    fn test_sample_size_respects_cap_and_floor() {
        let config = DemoConfig::default();
        assert_eq!(sample_size(&query(1, 50), &config), 50);
        assert_eq!(sample_size(&query(2, 50), &config), 50);
        assert_eq!(sample_size(&query(1_000_000, 1_000), &config), 500);
        assert_eq!(sample_size(&query(0, 0), &config), 50);
    }

    #[test]
    fn test_filters_scale_the_sample_up() {
        let config = DemoConfig::default();
        let mut filtered = query(20, 50);
        filtered.category = Some("user_action".to_string());
        let plain_needed = sample_size(&query(20, 50), &config);
        assert!(sample_size(&filtered, &config) > plain_needed);
    }

    #[test]
    fn test_event_ordering_within_session() {
        let page = generate_event_page(&params(), &query(1, 50), &clock(), &DemoConfig::default())
            .unwrap();
        // Regroup the page's events per session in ascending time.
        let mut by_session: std::collections::HashMap<String, Vec<&SimulatedEvent>> =
            std::collections::HashMap::new();
        for event in &page.events {
            by_session.entry(event.session_id.clone()).or_default().push(event);
        }
        for events in by_session.values_mut() {
            events.sort_by_key(|e| e.timestamp);
            let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
            if let Some(viewed) = types.iter().position(|t| *t == "step_viewed") {
                let started = types.iter().position(|t| *t == "checkout_started");
                assert!(started.is_some() && started.unwrap() < viewed || started.is_none());
            }
            if let Some(submitted) = types.iter().position(|t| *t == "payment_submitted") {
                let selected = types.iter().position(|t| *t == "payment_method_selected");
                // Pages can clip a session's prefix; when the selection event
                // is present it must precede the submission.
                if let Some(selected) = selected {
                    assert!(selected < submitted);
                }
            }
        }
    }

    #[test]
    fn test_full_session_streams_follow_the_state_graph() {
        let range = TimeRange {
            start: Utc.with_ymd_and_hms(2025, 6, 8, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap(),
        };
        for index in 0..200 {
            let events = SessionWalk::new("acme", index, &range).run();
            assert_eq!(events[0].event_type, "checkout_started");
            for pair in events.windows(2) {
                assert!(pair[0].timestamp <= pair[1].timestamp);
            }
            let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
            if let Some(submitted) = types.iter().position(|t| *t == "payment_submitted") {
                let selected = types
                    .iter()
                    .position(|t| *t == "payment_method_selected")
                    .expect("payment_submitted without payment_method_selected");
                assert!(selected < submitted);
            }
            if types.contains(&"order_confirmed") {
                assert!(types.contains(&"payment_completed"));
                assert!(!types.contains(&"error_occurred"));
            }
        }
    }

    #[test]
    fn test_pages_are_disjoint_with_identical_summaries() {
        let config = DemoConfig::default();
        let page1 =
            generate_event_page(&params(), &query(1, 50), &clock(), &config).unwrap();
        let page2 =
            generate_event_page(&params(), &query(2, 50), &clock(), &config).unwrap();

        let ids1: std::collections::HashSet<_> =
            page1.events.iter().map(|e| e.id.clone()).collect();
        let ids2: std::collections::HashSet<_> =
            page2.events.iter().map(|e| e.id.clone()).collect();
        assert!(ids1.is_disjoint(&ids2));
        assert_eq!(page1.summary.total_events, page2.summary.total_events);
        assert_eq!(page1.summary, page2.summary);
    }

    #[test]
    fn test_filters_apply() {
        let mut q = query(1, 100);
        q.category = Some("error".to_string());
        let page = generate_event_page(&params(), &q, &clock(), &DemoConfig::default()).unwrap();
        for event in &page.events {
            assert_eq!(event.category, EventCategory::Error);
            assert_eq!(event.event_type, "error_occurred");
        }
    }

    #[test]
    fn test_step_filter() {
        let mut q = query(1, 100);
        q.step = Some("shipping".to_string());
        let page = generate_event_page(&params(), &q, &clock(), &DemoConfig::default()).unwrap();
        assert!(!page.events.is_empty());
        for event in &page.events {
            assert_eq!(event.step.as_deref(), Some("shipping"));
        }
    }

    #[test]
    fn test_deterministic() {
        let config = DemoConfig::default();
        let a = generate_event_page(&params(), &query(1, 50), &clock(), &config).unwrap();
        let b = generate_event_page(&params(), &query(1, 50), &clock(), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_summary_extrapolates_to_population_scale() {
        let config = DemoConfig::default();
        let base = generate_base_metrics(&params(), &clock(), &config).unwrap();
        let page = generate_event_page(&params(), &query(1, 50), &clock(), &config).unwrap();
        // With ~4-13 events per session, extrapolated totals sit within a
        // small multiple of the notional session count.
        assert!(page.summary.total_events > base.total_sessions);
        assert!(page.summary.total_events < base.total_sessions * 20);
    }
}
