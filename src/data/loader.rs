use std::io::Read;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::model::{Event, EventCatalog, LoadError};

/// Bounded network timeout so a dead feed fails closed instead of hanging.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Fetch the catalog CSV from `url` and parse it.
///
/// A non-success HTTP status or a timeout surfaces as [`LoadError::Http`];
/// nothing here panics past the caller.
pub fn fetch_catalog(url: &str) -> Result<EventCatalog, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let body = client.get(url).send()?.error_for_status()?.text()?;
    parse_catalog(body.as_bytes())
}

/// Load a catalog from a local CSV file (File → Open…). Same schema as the
/// remote feed.
pub fn load_local(path: &Path) -> Result<EventCatalog, LoadError> {
    let file = std::fs::File::open(path)?;
    parse_catalog(std::io::BufReader::new(file))
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Parse catalog CSV. Header row is required; columns are located by name so
/// the feed may carry extra columns in any order.
///
/// Required columns: `time, latitude, longitude, mag, place`. `depth` is
/// optional (absent in some feed variants).
///
/// Rows with an unparseable timestamp or unparseable coordinates are skipped
/// and logged, counted in [`EventCatalog::skipped_rows`]. An empty or
/// unparseable `mag` cell becomes `None` (the event is kept).
pub fn parse_catalog<R: Read>(input: R) -> Result<EventCatalog, LoadError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let time_idx = column_index(&headers, "time")?;
    let lat_idx = column_index(&headers, "latitude")?;
    let lon_idx = column_index(&headers, "longitude")?;
    let mag_idx = column_index(&headers, "mag")?;
    let place_idx = column_index(&headers, "place")?;
    let depth_idx = headers.iter().position(|h| h == "depth");

    let mut events = Vec::new();
    let mut skipped = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;

        let raw_time = record.get(time_idx).unwrap_or("");
        let Some(time) = parse_timestamp(raw_time) else {
            log::warn!("row {row_no}: unparseable timestamp '{raw_time}', skipping");
            skipped += 1;
            continue;
        };

        let (Some(latitude), Some(longitude)) = (
            parse_f64(record.get(lat_idx)),
            parse_f64(record.get(lon_idx)),
        ) else {
            log::warn!("row {row_no}: unparseable coordinates, skipping");
            skipped += 1;
            continue;
        };

        events.push(Event {
            time,
            latitude,
            longitude,
            magnitude: parse_f64(record.get(mag_idx)),
            place: record.get(place_idx).unwrap_or("").to_string(),
            depth_km: depth_idx.and_then(|i| parse_f64(record.get(i))),
        });
    }

    if skipped > 0 {
        log::warn!("catalog parse dropped {skipped} rows");
    }
    Ok(EventCatalog::new(events, skipped))
}

fn column_index(headers: &[String], name: &'static str) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or(LoadError::MissingColumn(name))
}

/// The feed writes RFC 3339 timestamps ("2024-03-15T10:20:30.123Z").
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_f64(cell: Option<&str>) -> Option<f64> {
    cell.and_then(|s| s.trim().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FULL: &str = "\
time,latitude,longitude,depth,mag,magType,place
2024-03-15T10:20:30.000Z,35.5,-117.6,8.2,5.2,ml,\"12 km SW of Ridgecrest, CA\"
2024-03-01T00:10:00.000Z,61.2,-149.9,40.0,2.5,ml,\"Anchorage, Alaska\"
";

    #[test]
    fn parses_required_and_optional_columns() {
        let catalog = parse_catalog(FULL.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.skipped_rows, 0);

        let ev = &catalog.events[0];
        assert_eq!(
            ev.time,
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 20, 30).unwrap()
        );
        assert_eq!(ev.latitude, 35.5);
        assert_eq!(ev.longitude, -117.6);
        assert_eq!(ev.magnitude, Some(5.2));
        assert_eq!(ev.depth_km, Some(8.2));
        assert_eq!(ev.place, "12 km SW of Ridgecrest, CA");
    }

    #[test]
    fn depth_column_is_optional() {
        let csv = "\
time,latitude,longitude,mag,place
2024-03-15T10:20:30.000Z,35.5,-117.6,5.2,Ridgecrest
";
        let catalog = parse_catalog(csv.as_bytes()).unwrap();
        assert_eq!(catalog.events[0].depth_km, None);
    }

    #[test]
    fn empty_magnitude_is_none_not_an_error() {
        let csv = "\
time,latitude,longitude,mag,place
2024-03-15T10:20:30.000Z,35.5,-117.6,,Ridgecrest
";
        let catalog = parse_catalog(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.events[0].magnitude, None);
    }

    #[test]
    fn bad_timestamp_rows_are_skipped_and_counted() {
        let csv = "\
time,latitude,longitude,mag,place
not-a-time,35.5,-117.6,5.2,Ridgecrest
2024-03-15T10:20:30.000Z,35.5,-117.6,5.2,Ridgecrest
";
        let catalog = parse_catalog(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.skipped_rows, 1);
    }

    #[test]
    fn bad_coordinates_are_skipped_and_counted() {
        let csv = "\
time,latitude,longitude,mag,place
2024-03-15T10:20:30.000Z,north,-117.6,5.2,Ridgecrest
";
        let catalog = parse_catalog(csv.as_bytes()).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.skipped_rows, 1);
    }

    #[test]
    fn missing_required_column_is_a_parse_failure() {
        let csv = "time,latitude,longitude,place\n2024-03-15T10:20:30.000Z,1.0,2.0,x\n";
        match parse_catalog(csv.as_bytes()) {
            Err(LoadError::MissingColumn(col)) => assert_eq!(col, "mag"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn offset_timestamps_normalize_to_utc() {
        let csv = "\
time,latitude,longitude,mag,place
2024-03-15T12:20:30.000+02:00,35.5,-117.6,5.2,Ridgecrest
";
        let catalog = parse_catalog(csv.as_bytes()).unwrap();
        assert_eq!(
            catalog.events[0].time,
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 20, 30).unwrap()
        );
    }
}
