use std::collections::BTreeMap;

use eframe::egui::Ui;
use egui_plot::{MarkerShape, Plot, PlotPoint, Points};

use crate::encode::{heatmap_color, heatmap_weight, MapRecord};
use crate::state::{AppState, MapMode};
use crate::ui::month_name;

/// Cluster grid resolution in degrees.
const CELL_DEG: f64 = 5.0;

/// Hover tooltip picks the closest marker within this many degrees.
const HOVER_RADIUS_DEG: f64 = 3.0;

// ---------------------------------------------------------------------------
// Map panel (central)
// ---------------------------------------------------------------------------

/// Render the map scatter in the central panel.
pub fn map_panel(ui: &mut Ui, state: &AppState) {
    if state.catalog.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            if state.loading {
                ui.heading("Fetching catalog…");
            } else if let Some(msg) = &state.status_message {
                ui.heading(msg);
            } else {
                ui.heading("No catalog loaded.");
            }
        });
        return;
    }

    let records = &state.visible_records;
    if records.is_empty() {
        // "couldn't fetch" and "nothing matched" are different messages.
        let msg = match &state.status_message {
            Some(err) => err.clone(),
            None => format!(
                "No earthquakes matched {} {} at M ≥ {:.1} yet.",
                month_name(state.params.month),
                state.params.year,
                state.params.min_magnitude
            ),
        };
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading(msg);
        });
        return;
    }

    // The label formatter closure must own its data ('static).
    let hover_records = records.clone();
    let mode = state.map_mode;

    Plot::new("quake_map")
        .data_aspect(1.0)
        .include_x(-180.0)
        .include_x(180.0)
        .include_y(-90.0)
        .include_y(90.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .label_formatter(move |_name, pos| hover_label(&hover_records, pos))
        .show(ui, |plot_ui| match mode {
            MapMode::Individual => {
                for rec in records {
                    plot_ui.points(
                        Points::new(vec![[rec.longitude, rec.latitude]])
                            .shape(MarkerShape::Circle)
                            .filled(true)
                            .radius(rec.marker_size * 0.5)
                            .color(rec.tier.color()),
                    );
                }
            }
            MapMode::Heatmap => {
                for rec in records {
                    plot_ui.points(
                        Points::new(vec![[rec.longitude, rec.latitude]])
                            .shape(MarkerShape::Circle)
                            .filled(true)
                            .radius(4.0)
                            .color(heatmap_color(heatmap_weight(rec.magnitude))),
                    );
                }
            }
            MapMode::Cluster => {
                for cell in cluster_cells(records, CELL_DEG) {
                    let radius = (4.0 + (cell.count as f32).sqrt() * 2.0).min(24.0);
                    plot_ui.points(
                        Points::new(vec![[cell.lon, cell.lat]])
                            .shape(MarkerShape::Circle)
                            .filled(true)
                            .radius(radius)
                            .color(cell.max_tier().color()),
                    );
                }
            }
        });
}

/// Tooltip text: nearest event within [`HOVER_RADIUS_DEG`], mirroring the
/// original marker popup (place, magnitude, time).
fn hover_label(records: &[MapRecord], pos: &PlotPoint) -> String {
    let nearest = records
        .iter()
        .map(|rec| {
            let dx = rec.longitude - pos.x;
            let dy = rec.latitude - pos.y;
            (dx * dx + dy * dy, rec)
        })
        .min_by(|(d1, _), (d2, _)| d1.total_cmp(d2));

    match nearest {
        Some((dist_sq, rec)) if dist_sq <= HOVER_RADIUS_DEG * HOVER_RADIUS_DEG => {
            format!(
                "{}\nM {:.1} · {}",
                rec.place,
                rec.magnitude,
                rec.time.format("%Y-%m-%d %H:%M UTC")
            )
        }
        _ => format!("{:.1}°, {:.1}°", pos.y, pos.x),
    }
}

// ---------------------------------------------------------------------------
// Cluster grid
// ---------------------------------------------------------------------------

/// One occupied grid cell in cluster mode.
#[derive(Debug, PartialEq)]
pub(crate) struct ClusterCell {
    /// Centroid of member events.
    pub lon: f64,
    pub lat: f64,
    pub count: usize,
    pub max_magnitude: f64,
}

impl ClusterCell {
    pub(crate) fn max_tier(&self) -> crate::encode::Tier {
        crate::encode::Tier::for_magnitude(self.max_magnitude)
    }
}

/// Bucket records into `cell_deg`-sized grid cells. Cell order is
/// deterministic (sorted by grid coordinate).
pub(crate) fn cluster_cells(records: &[MapRecord], cell_deg: f64) -> Vec<ClusterCell> {
    let mut cells: BTreeMap<(i64, i64), (f64, f64, usize, f64)> = BTreeMap::new();

    for rec in records {
        let key = (
            (rec.longitude / cell_deg).floor() as i64,
            (rec.latitude / cell_deg).floor() as i64,
        );
        let entry = cells.entry(key).or_insert((0.0, 0.0, 0, f64::NEG_INFINITY));
        entry.0 += rec.longitude;
        entry.1 += rec.latitude;
        entry.2 += 1;
        entry.3 = entry.3.max(rec.magnitude);
    }

    cells
        .into_values()
        .map(|(lon_sum, lat_sum, count, max_magnitude)| ClusterCell {
            lon: lon_sum / count as f64,
            lat: lat_sum / count as f64,
            count,
            max_magnitude,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Event;
    use crate::encode::Tier;
    use chrono::{TimeZone, Utc};

    fn record(lat: f64, lon: f64, mag: f64) -> MapRecord {
        MapRecord::from_event(&Event {
            time: Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap(),
            latitude: lat,
            longitude: lon,
            magnitude: Some(mag),
            place: "test".to_string(),
            depth_km: None,
        })
        .unwrap()
    }

    #[test]
    fn nearby_events_share_a_cell() {
        let records = vec![
            record(35.1, -117.2, 4.0),
            record(36.9, -116.1, 6.2),
            record(-20.0, 140.0, 3.1),
        ];
        let cells = cluster_cells(&records, 5.0);
        assert_eq!(cells.len(), 2);

        let big = cells.iter().find(|c| c.count == 2).unwrap();
        assert_eq!(big.max_magnitude, 6.2);
        assert_eq!(big.max_tier(), Tier::Strong);
        // Centroid of the two members.
        assert!((big.lat - 36.0).abs() < 1e-9);
        assert!((big.lon - (-116.65)).abs() < 1e-9);
    }

    #[test]
    fn empty_input_yields_no_cells() {
        assert!(cluster_cells(&[], 5.0).is_empty());
    }

    #[test]
    fn hover_label_prefers_nearby_event() {
        let records = vec![record(35.0, -117.0, 5.2)];
        let near = hover_label(&records, &PlotPoint::new(-117.5, 35.5));
        assert!(near.contains("M 5.2"));
        assert!(near.contains("test"));

        let far = hover_label(&records, &PlotPoint::new(100.0, -40.0));
        assert!(!far.contains("M 5.2"));
    }
}
