use chrono::{DateTime, Datelike, Utc};

use super::model::EventCatalog;

// ---------------------------------------------------------------------------
// Filter parameters
// ---------------------------------------------------------------------------

/// The user-tunable filter window. Calendar month/year in UTC, not a rolling
/// 30-day window, so zero matches just after month rollover is expected.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub year: i32,
    /// 1-based calendar month.
    pub month: u32,
    pub min_magnitude: f64,
    pub max_count: usize,
}

impl FilterParams {
    /// Defaults matching the dashboard: current UTC month, M ≥ 3.0, 300 rows.
    pub fn for_month(now: DateTime<Utc>) -> Self {
        FilterParams {
            year: now.year(),
            month: now.month(),
            min_magnitude: 3.0,
            max_count: 300,
        }
    }
}

// ---------------------------------------------------------------------------
// Pure filtering – index views, the catalog is never mutated
// ---------------------------------------------------------------------------

/// Indices of events inside the calendar window with magnitude at or above
/// the threshold, truncated to `max_count`.
///
/// Truncation is a prefix-take in feed order (head semantics), not a top-k by
/// magnitude or time. Events without a magnitude never pass the threshold.
/// Empty input yields empty output; this stage cannot fail.
pub fn filtered_indices(catalog: &EventCatalog, params: &FilterParams) -> Vec<usize> {
    catalog
        .events
        .iter()
        .enumerate()
        .filter(|(_, ev)| {
            ev.time.year() == params.year
                && ev.time.month() == params.month
                && ev.magnitude.is_some_and(|m| m >= params.min_magnitude)
        })
        .map(|(i, _)| i)
        .take(params.max_count)
        .collect()
}

/// Indices of the `n` most recent events in the whole catalog, newest first.
/// Distinct from [`filtered_indices`]: this ranks by timestamp and ignores
/// the calendar window and magnitude threshold.
pub fn top_by_time(catalog: &EventCatalog, n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..catalog.len()).collect();
    indices.sort_by_key(|&i| std::cmp::Reverse(catalog.events[i].time));
    indices.truncate(n);
    indices
}
