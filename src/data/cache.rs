use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::model::{EventCatalog, LoadError};

/// The feed is considered fresh for one hour.
pub fn default_ttl() -> Duration {
    Duration::hours(1)
}

// ---------------------------------------------------------------------------
// CatalogCache – TTL snapshot cache for the fetched catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<EventCatalog>,
    fetched_at: DateTime<Utc>,
}

/// Holds at most one immutable catalog snapshot per source URL, replaced
/// wholesale on expiry. Expiry is an explicit `is_stale(now)` check, so tests
/// drive the clock instead of mocking it.
///
/// A failed refetch keeps the previous (stale) snapshot: the UI can keep
/// showing old data next to the error instead of going blank.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    url: String,
    ttl: Duration,
    entry: Option<CacheEntry>,
}

impl CatalogCache {
    pub fn new(url: impl Into<String>, ttl: Duration) -> Self {
        CatalogCache {
            url: url.into(),
            ttl,
            entry: None,
        }
    }

    /// Cache with the standard one-hour TTL.
    pub fn hourly(url: impl Into<String>) -> Self {
        Self::new(url, default_ttl())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Point the cache at a different source. The entry is keyed by URL, so
    /// changing it drops the snapshot.
    pub fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if url != self.url {
            self.url = url;
            self.entry = None;
        }
    }

    /// True when there is no snapshot or the snapshot has outlived the TTL.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match &self.entry {
            Some(entry) => now - entry.fetched_at >= self.ttl,
            None => true,
        }
    }

    /// The cached snapshot, only if still fresh.
    pub fn get(&self, now: DateTime<Utc>) -> Option<Arc<EventCatalog>> {
        match &self.entry {
            Some(entry) if !self.is_stale(now) => Some(Arc::clone(&entry.snapshot)),
            _ => None,
        }
    }

    /// The cached snapshot regardless of freshness. Fallback for the UI
    /// while a refetch is in flight or has failed.
    pub fn snapshot(&self) -> Option<Arc<EventCatalog>> {
        self.entry.as_ref().map(|e| Arc::clone(&e.snapshot))
    }

    /// Replace the snapshot wholesale and restart the TTL clock.
    pub fn store(&mut self, now: DateTime<Utc>, catalog: EventCatalog) -> Arc<EventCatalog> {
        let snapshot = Arc::new(catalog);
        self.entry = Some(CacheEntry {
            snapshot: Arc::clone(&snapshot),
            fetched_at: now,
        });
        snapshot
    }

    /// Return the fresh snapshot, or run `fetch` and cache its result.
    /// Within one TTL window `fetch` runs at most once.
    pub fn get_or_fetch<F>(&mut self, now: DateTime<Utc>, fetch: F) -> Result<Arc<EventCatalog>, LoadError>
    where
        F: FnOnce() -> Result<EventCatalog, LoadError>,
    {
        if let Some(snapshot) = self.get(now) {
            return Ok(snapshot);
        }
        Ok(self.store(now, fetch()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Event;
    use chrono::TimeZone;

    fn catalog(n: usize) -> EventCatalog {
        let events = (0..n)
            .map(|i| Event {
                time: Utc.with_ymd_and_hms(2024, 3, 1 + i as u32, 0, 0, 0).unwrap(),
                latitude: 0.0,
                longitude: 0.0,
                magnitude: Some(4.0),
                place: format!("event {i}"),
                depth_km: None,
            })
            .collect();
        EventCatalog::new(events, 0)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn second_call_within_ttl_hits_cache_and_fetches_once() {
        let mut cache = CatalogCache::hourly("http://example.test/feed.csv");
        let mut fetches = 0;

        let first = cache
            .get_or_fetch(t0(), || {
                fetches += 1;
                Ok(catalog(3))
            })
            .unwrap();
        let second = cache
            .get_or_fetch(t0() + Duration::minutes(59), || {
                fetches += 1;
                Ok(catalog(99))
            })
            .unwrap();

        assert_eq!(fetches, 1);
        // Bit-identical: same Arc, not merely equal contents.
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn expired_entry_triggers_refetch() {
        let mut cache = CatalogCache::hourly("http://example.test/feed.csv");
        cache.store(t0(), catalog(3));

        let later = t0() + Duration::minutes(61);
        assert!(cache.is_stale(later));
        assert_eq!(cache.get(later), None);

        let refreshed = cache.get_or_fetch(later, || Ok(catalog(5))).unwrap();
        assert_eq!(refreshed.len(), 5);
        assert!(!cache.is_stale(later));
    }

    #[test]
    fn empty_cache_is_stale() {
        let cache = CatalogCache::hourly("http://example.test/feed.csv");
        assert!(cache.is_stale(t0()));
        assert!(cache.get(t0()).is_none());
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn failed_refetch_keeps_stale_snapshot() {
        let mut cache = CatalogCache::hourly("http://example.test/feed.csv");
        cache.store(t0(), catalog(3));

        let later = t0() + Duration::hours(2);
        let result = cache.get_or_fetch(later, || {
            Err(LoadError::MissingColumn("mag"))
        });
        assert!(result.is_err());

        // Old data is still reachable for the UI.
        let stale = cache.snapshot().unwrap();
        assert_eq!(stale.len(), 3);
        assert!(cache.is_stale(later));
    }

    #[test]
    fn changing_url_drops_entry() {
        let mut cache = CatalogCache::hourly("http://example.test/a.csv");
        cache.store(t0(), catalog(3));
        cache.set_url("http://example.test/b.csv");
        assert!(cache.snapshot().is_none());

        // Same URL is a no-op.
        let mut cache = CatalogCache::hourly("http://example.test/a.csv");
        cache.store(t0(), catalog(3));
        cache.set_url("http://example.test/a.csv");
        assert!(cache.snapshot().is_some());
    }
}
