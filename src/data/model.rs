use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Event – one row of the catalog
// ---------------------------------------------------------------------------

/// A single seismic event (one row of the upstream catalog).
///
/// Source ordering is whatever the feed returned; it is not guaranteed to be
/// sorted by time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Origin time, UTC.
    pub time: DateTime<Utc>,
    /// Epicenter latitude in degrees.
    pub latitude: f64,
    /// Epicenter longitude in degrees.
    pub longitude: f64,
    /// Magnitude. May be negative (micro-events) or absent in the feed.
    pub magnitude: Option<f64>,
    /// Free-text location description, e.g. "12 km SW of Ridgecrest, CA".
    pub place: String,
    /// Hypocenter depth in kilometers. Not present in every feed variant.
    pub depth_km: Option<f64>,
}

// ---------------------------------------------------------------------------
// EventCatalog – the complete fetched dataset
// ---------------------------------------------------------------------------

/// The full parsed catalog. Immutable once built; filtering produces index
/// views into `events` and never mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCatalog {
    /// All events, in feed order.
    pub events: Vec<Event>,
    /// Rows the parser dropped (unparseable timestamp or coordinates).
    pub skipped_rows: usize,
}

impl EventCatalog {
    pub fn new(events: Vec<Event>, skipped_rows: usize) -> Self {
        EventCatalog {
            events,
            skipped_rows,
        }
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Earliest and latest event time in the catalog, if non-empty.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.events.first()?.time;
        Some(self.events.iter().fold((first, first), |(lo, hi), ev| {
            (lo.min(ev.time), hi.max(ev.time))
        }))
    }
}

// ---------------------------------------------------------------------------
// LoadError – loader failure taxonomy
// ---------------------------------------------------------------------------

/// Everything that can go wrong between a URL and an [`EventCatalog`].
///
/// An empty filter result is deliberately *not* represented here: zero
/// matching events is a valid terminal state, and the UI shows a distinct
/// "nothing matched" message for it.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The fetch could not complete or the server returned a non-success
    /// status (timeouts included).
    #[error("fetching catalog: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not well-formed CSV.
    #[error("reading catalog CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV header row lacks a column the catalog schema requires.
    #[error("catalog is missing required column '{0}'")]
    MissingColumn(&'static str),

    /// A local catalog file could not be opened.
    #[error("opening catalog file: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(time: DateTime<Utc>) -> Event {
        Event {
            time,
            latitude: 0.0,
            longitude: 0.0,
            magnitude: Some(1.0),
            place: String::new(),
            depth_km: None,
        }
    }

    #[test]
    fn time_span_of_empty_catalog_is_none() {
        assert_eq!(EventCatalog::default().time_span(), None);
    }

    #[test]
    fn time_span_ignores_feed_order() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let catalog = EventCatalog::new(vec![event(t1), event(t2), event(t3)], 0);
        assert_eq!(catalog.time_span(), Some((t2, t3)));
    }
}
