//! Maps a logical period to a concrete `[start, end)` window.
//!
//! This is the only place wall-clock time enters the engine: named periods
//! end at `clock.now()`. Downstream generators treat the resolved range as an
//! opaque deterministic input.

use insights_core::{Clock, InsightsError, InsightsResult, Period, TimeRange};

use chrono::{DateTime, Utc};

/// Resolve a period (plus optional explicit dates) into a concrete window.
///
/// `custom` fails closed when either date is missing or the window is
/// inverted; a malformed window must never be silently computed.
pub fn resolve_range(
    period: Period,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    clock: &dyn Clock,
) -> InsightsResult<TimeRange> {
    match period {
        Period::Custom => {
            let (start, end) = match (start_date, end_date) {
                (Some(s), Some(e)) => (s, e),
                _ => {
                    return Err(InsightsError::InvalidRange(
                        "custom period requires both startDate and endDate".to_string(),
                    ))
                }
            };
            if end < start {
                return Err(InsightsError::InvalidRange(format!(
                    "endDate {} precedes startDate {}",
                    end, start
                )));
            }
            Ok(TimeRange { start, end })
        }
        named => {
            let end = clock.now();
            // length() is Some for every named period.
            let span = named.length().unwrap_or_else(|| chrono::Duration::days(7));
            Ok(TimeRange {
                start: end - span,
                end,
            })
        }
    }
}
