use std::collections::BTreeMap;

use chrono::Datelike;
use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Plot};

use crate::encode::MapRecord;
use crate::state::AppState;

/// Histogram bin width in magnitude units.
const BIN_WIDTH: f64 = 0.5;

// ---------------------------------------------------------------------------
// Charts panel (bottom): daily-count timeline + magnitude histogram
// ---------------------------------------------------------------------------

pub fn charts_panel(ui: &mut Ui, state: &AppState) {
    let records = &state.visible_records;
    if records.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No data to chart.");
        });
        return;
    }

    ui.columns(2, |cols| {
        timeline_chart(&mut cols[0], records);
        histogram_chart(&mut cols[1], records);
    });
}

fn timeline_chart(ui: &mut Ui, records: &[MapRecord]) {
    let bars: Vec<Bar> = daily_counts(records)
        .into_iter()
        .map(|(day, count)| {
            Bar::new(day as f64, count as f64)
                .width(0.8)
                .fill(Color32::from_rgb(66, 133, 244))
        })
        .collect();

    Plot::new("daily_timeline")
        .x_axis_label("Day of month")
        .y_axis_label("Events")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Events per day"));
        });
}

fn histogram_chart(ui: &mut Ui, records: &[MapRecord]) {
    let bars: Vec<Bar> = magnitude_histogram(records, BIN_WIDTH)
        .into_iter()
        .map(|(bin, count)| {
            let center = (bin as f64 + 0.5) * BIN_WIDTH;
            Bar::new(center, count as f64)
                .width(BIN_WIDTH * 0.9)
                .fill(crate::encode::Tier::for_magnitude(center).color())
        })
        .collect();

    Plot::new("magnitude_histogram")
        .x_axis_label("Magnitude")
        .y_axis_label("Events")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Magnitude distribution"));
        });
}

// ---------------------------------------------------------------------------
// Aggregations (consumer-side, not part of the data core)
// ---------------------------------------------------------------------------

/// Events per calendar day. The filtered view spans a single month, so the
/// day of month is a sufficient key.
pub(crate) fn daily_counts(records: &[MapRecord]) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for rec in records {
        *counts.entry(rec.time.day()).or_insert(0) += 1;
    }
    counts
}

/// Counts per magnitude bin; key is the bin index (`floor(mag / width)`),
/// valid for negative magnitudes too.
pub(crate) fn magnitude_histogram(records: &[MapRecord], bin_width: f64) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for rec in records {
        let bin = (rec.magnitude / bin_width).floor() as i64;
        *counts.entry(bin).or_insert(0) += 1;
    }
    counts
}
