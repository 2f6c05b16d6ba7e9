use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};

use crate::data::cache::CatalogCache;
use crate::data::filter::{filtered_indices, top_by_time, FilterParams};
use crate::data::loader;
use crate::data::model::{EventCatalog, LoadError};
use crate::encode::MapRecord;

/// USGS rolling 30-day summary feed, all magnitudes.
pub const FEED_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_month.csv";

/// How many entries the "Latest events" list shows.
pub const LATEST_COUNT: usize = 10;

/// Minimum gap between automatic fetch attempts after a failure.
pub const RETRY_HOLDOFF_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Map rendering mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    Cluster,
    Heatmap,
    Individual,
}

impl MapMode {
    pub const ALL: [MapMode; 3] = [MapMode::Cluster, MapMode::Heatmap, MapMode::Individual];

    pub fn label(&self) -> &'static str {
        match self {
            MapMode::Cluster => "Cluster",
            MapMode::Heatmap => "Heatmap",
            MapMode::Individual => "Individual",
        }
    }
}

// ---------------------------------------------------------------------------
// Where the current catalog came from
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// The remote feed; refetched automatically when the cache goes stale.
    Feed,
    /// A local CSV opened by the user; never auto-refreshed over.
    LocalFile,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// TTL cache in front of the remote feed.
    pub cache: CatalogCache,

    /// Current catalog snapshot (shared, immutable).
    pub catalog: Option<Arc<EventCatalog>>,

    /// Where `catalog` came from.
    pub source: CatalogSource,

    /// User-tunable filter window.
    pub params: FilterParams,

    /// True once the user has touched the window; until then the month
    /// defaults roll forward with the UTC calendar.
    pub params_edited: bool,

    /// Indices of events passing the current filter (cached view).
    pub visible_indices: Vec<usize>,

    /// Encoded records for the filtered view, rebuilt in [`Self::refilter`]
    /// so the map and charts don't re-encode every frame.
    pub visible_records: Vec<MapRecord>,

    /// Indices of the most recent events in the whole catalog.
    pub latest_indices: Vec<usize>,

    /// Map rendering mode.
    pub map_mode: MapMode,

    /// Fetch / parse error shown in the UI, None when healthy.
    pub status_message: Option<String>,

    /// Whether a fetch is in flight.
    pub loading: bool,

    /// Result channel for the in-flight fetch thread.
    fetch_rx: Option<Receiver<Result<EventCatalog, LoadError>>>,

    /// When the last fetch started; auto-retry after a failure waits out
    /// [`RETRY_HOLDOFF_SECS`] instead of refetching every frame.
    last_fetch_started: Option<DateTime<Utc>>,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            cache: CatalogCache::hourly(FEED_URL),
            catalog: None,
            source: CatalogSource::Feed,
            params: FilterParams::for_month(Utc::now()),
            params_edited: false,
            visible_indices: Vec::new(),
            visible_records: Vec::new(),
            latest_indices: Vec::new(),
            map_mode: MapMode::Cluster,
            status_message: None,
            loading: false,
            fetch_rx: None,
            last_fetch_started: None,
        }
    }
}

impl AppState {
    /// Per-frame upkeep: roll the default window across month boundaries,
    /// collect a finished fetch, then kick off a refetch when the cached
    /// snapshot has gone stale.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if !self.params_edited {
            let default = FilterParams::for_month(now);
            if self.params != default {
                self.params = default;
                self.refilter();
            }
        }
        self.poll_fetch(now);
        let holdoff_over = self
            .last_fetch_started
            .is_none_or(|t| now - t >= chrono::Duration::seconds(RETRY_HOLDOFF_SECS));
        if self.source == CatalogSource::Feed
            && !self.loading
            && self.cache.is_stale(now)
            && holdoff_over
        {
            self.start_fetch(now);
        }
    }

    /// Spawn one background thread running the blocking fetch.
    pub fn start_fetch(&mut self, now: DateTime<Utc>) {
        if self.loading {
            return;
        }
        self.last_fetch_started = Some(now);
        let url = self.cache.url().to_string();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // Receiver may be gone if the app shut down; nothing to do then.
            let _ = tx.send(loader::fetch_catalog(&url));
        });
        self.fetch_rx = Some(rx);
        self.loading = true;
        log::info!("fetching catalog from {}", self.cache.url());
    }

    /// User-initiated refresh: switch back to the feed and refetch now,
    /// ignoring the TTL. The old snapshot stays visible until replaced.
    pub fn refresh(&mut self) {
        self.source = CatalogSource::Feed;
        self.start_fetch(Utc::now());
    }

    fn poll_fetch(&mut self, now: DateTime<Utc>) {
        let Some(rx) = &self.fetch_rx else { return };
        match rx.try_recv() {
            Ok(Ok(catalog)) => {
                log::info!(
                    "fetched {} events ({} rows skipped)",
                    catalog.len(),
                    catalog.skipped_rows
                );
                let snapshot = self.cache.store(now, catalog);
                // A local catalog opened mid-fetch wins; the feed result
                // only warms the cache for the next refresh.
                if self.source == CatalogSource::Feed {
                    self.install_snapshot(snapshot);
                } else {
                    self.loading = false;
                }
                self.fetch_rx = None;
            }
            Ok(Err(err)) => {
                log::error!("catalog fetch failed: {err}");
                self.status_message = Some(format!("Couldn't fetch catalog: {err}"));
                self.loading = false;
                self.fetch_rx = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.loading = false;
                self.fetch_rx = None;
            }
        }
    }

    /// Ingest a new snapshot and rebuild the derived views.
    fn install_snapshot(&mut self, snapshot: Arc<EventCatalog>) {
        self.latest_indices = top_by_time(&snapshot, LATEST_COUNT);
        self.catalog = Some(snapshot);
        self.status_message = None;
        self.loading = false;
        self.refilter();
    }

    /// Recompute the filtered view (indices and encoded records) after a
    /// parameter change.
    pub fn refilter(&mut self) {
        let Some(catalog) = &self.catalog else {
            self.visible_indices = Vec::new();
            self.visible_records = Vec::new();
            return;
        };
        self.visible_indices = filtered_indices(catalog, &self.params);
        self.visible_records = self
            .visible_indices
            .iter()
            .filter_map(|&i| MapRecord::from_event(&catalog.events[i]))
            .collect();
    }

    /// Load a catalog from a local CSV file (bypasses the feed cache).
    pub fn open_local(&mut self, path: &Path) {
        match loader::load_local(path) {
            Ok(catalog) => {
                log::info!(
                    "loaded {} events from {} ({} rows skipped)",
                    catalog.len(),
                    path.display(),
                    catalog.skipped_rows
                );
                self.source = CatalogSource::LocalFile;
                self.install_snapshot(Arc::new(catalog));
            }
            Err(err) => {
                log::error!("failed to load {}: {err}", path.display());
                self.status_message = Some(format!("Couldn't open catalog: {err}"));
            }
        }
    }

    /// Write the filtered, encoded records as pretty JSON.
    pub fn export_json(&self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &self.visible_records)?;
        log::info!(
            "exported {} records to {}",
            self.visible_records.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Event;
    use chrono::TimeZone;

    fn catalog() -> EventCatalog {
        let event = |mag: Option<f64>, day: u32| Event {
            time: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            latitude: 35.0,
            longitude: -117.0,
            magnitude: mag,
            place: "test".to_string(),
            depth_km: None,
        };
        EventCatalog::new(
            vec![event(Some(5.2), 15), event(Some(2.0), 16), event(None, 17)],
            0,
        )
    }

    fn state_with_catalog() -> AppState {
        let mut state = AppState {
            params: FilterParams {
                year: 2024,
                month: 3,
                min_magnitude: 3.0,
                max_count: 300,
            },
            ..AppState::default()
        };
        state.install_snapshot(Arc::new(catalog()));
        state
    }

    fn march(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn installing_snapshot_rebuilds_views() {
        let state = state_with_catalog();
        assert_eq!(state.visible_indices, vec![0]);
        // Latest list ranks by time regardless of magnitude presence.
        assert_eq!(state.latest_indices, vec![2, 1, 0]);
        assert!(!state.loading);
        assert!(state.status_message.is_none());
    }

    #[test]
    fn refilter_tracks_parameter_changes() {
        let mut state = state_with_catalog();
        state.params.min_magnitude = 0.0;
        state.refilter();
        assert_eq!(state.visible_indices, vec![0, 1]);

        state.params.month = 4;
        state.refilter();
        assert!(state.visible_indices.is_empty());
    }

    #[test]
    fn refilter_keeps_encoded_records_in_sync() {
        let mut state = state_with_catalog();
        assert_eq!(state.visible_records.len(), 1);
        assert_eq!(state.visible_records[0].magnitude, 5.2);
        assert_eq!(state.visible_records[0].tier_color, "#ff8c00");

        state.params.min_magnitude = 0.0;
        state.refilter();
        assert_eq!(state.visible_records.len(), state.visible_indices.len());
        assert_eq!(state.visible_records.len(), 2);
    }

    #[test]
    fn local_catalog_survives_inflight_feed_fetch() {
        let mut state = state_with_catalog();

        // A feed fetch is in flight...
        let (tx, rx) = mpsc::channel();
        state.fetch_rx = Some(rx);
        state.loading = true;

        // ...when the user opens a one-event local catalog.
        let path = std::env::temp_dir().join(format!(
            "quakemap_local_catalog_{}.csv",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "time,latitude,longitude,mag,place\n\
             2024-03-02T00:00:00.000Z,10.0,20.0,4.5,Local\n",
        )
        .unwrap();
        state.open_local(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(state.source, CatalogSource::LocalFile);
        assert_eq!(state.catalog.as_ref().unwrap().len(), 1);

        // The fetch completes afterwards: the local catalog must stay, the
        // feed snapshot only lands in the cache.
        tx.send(Ok(catalog())).unwrap();
        state.tick(march(20));

        assert_eq!(state.source, CatalogSource::LocalFile);
        assert_eq!(state.catalog.as_ref().unwrap().len(), 1);
        assert_eq!(state.visible_records.len(), 1);
        assert!(!state.loading);
        assert_eq!(state.cache.snapshot().unwrap().len(), 3);
    }

    #[test]
    fn default_window_follows_month_rollover() {
        let mut state = state_with_catalog();
        state.source = CatalogSource::LocalFile;
        let april = Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        state.tick(april);
        assert_eq!(state.params.month, 4);
        // The catalog is all March, so the rolled window matches nothing.
        assert!(state.visible_indices.is_empty());
    }

    #[test]
    fn edited_window_is_not_rolled_forward() {
        let mut state = state_with_catalog();
        state.source = CatalogSource::LocalFile;
        state.params_edited = true;
        let april = Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        state.tick(april);
        assert_eq!(state.params.month, 3);
        assert_eq!(state.visible_indices, vec![0]);
    }
}
