use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::encode::legend_entries;
use crate::state::{AppState, MapMode};
use crate::ui::{month_name, MONTH_NAMES};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Calendar window ----
            ui.strong("Month");
            ui.horizontal(|ui: &mut Ui| {
                egui::ComboBox::from_id_salt("month_picker")
                    .selected_text(month_name(state.params.month))
                    .show_ui(ui, |ui: &mut Ui| {
                        for (i, name) in MONTH_NAMES.iter().enumerate() {
                            let month = i as u32 + 1;
                            if ui
                                .selectable_label(state.params.month == month, *name)
                                .clicked()
                            {
                                state.params.month = month;
                                changed = true;
                            }
                        }
                    });
                if ui
                    .add(egui::DragValue::new(&mut state.params.year).range(1900..=2100))
                    .changed()
                {
                    changed = true;
                }
            });
            ui.separator();

            // ---- Thresholds ----
            changed |= ui
                .add(
                    egui::Slider::new(&mut state.params.min_magnitude, 0.0..=9.0)
                        .step_by(0.1)
                        .text("Min magnitude"),
                )
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut state.params.max_count, 50..=1000).text("Max events"))
                .changed();
            ui.separator();

            // ---- Map style ----
            ui.strong("Map style");
            ui.horizontal(|ui: &mut Ui| {
                for mode in MapMode::ALL {
                    if ui
                        .selectable_label(state.map_mode == mode, mode.label())
                        .clicked()
                    {
                        state.map_mode = mode;
                    }
                }
            });
            ui.separator();

            // ---- Summary line ----
            ui.label(format!(
                "Showing M ≥ {:.1} earthquakes during {} {} — {} events.",
                state.params.min_magnitude,
                month_name(state.params.month),
                state.params.year,
                state.visible_indices.len()
            ));
            if let Some(span) = state.catalog.as_ref().and_then(|c| c.time_span()) {
                ui.label(
                    RichText::new(format!(
                        "Catalog covers {} – {}",
                        span.0.format("%Y-%m-%d"),
                        span.1.format("%Y-%m-%d")
                    ))
                    .weak(),
                );
            }
            ui.separator();

            // ---- Legend ----
            ui.strong("Legend");
            for (label, color) in legend_entries() {
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new("●").color(color));
                    ui.label(label);
                });
            }
            ui.separator();

            // ---- Latest events ----
            latest_events(ui, state);
        });

    if changed {
        state.params_edited = true;
        state.refilter();
    }
}

/// The ten most recent events in the whole catalog, ignoring filters.
fn latest_events(ui: &mut Ui, state: &AppState) {
    let Some(catalog) = &state.catalog else { return };

    egui::CollapsingHeader::new(RichText::new("Latest events").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            for &idx in &state.latest_indices {
                let ev = &catalog.events[idx];
                let mag = ev
                    .magnitude
                    .map(|m| format!("M {m:.1}"))
                    .unwrap_or_else(|| "M ?".to_string());
                ui.label(format!(
                    "{mag} — {}\n{}",
                    ev.place,
                    ev.time.format("%Y-%m-%d %H:%M UTC")
                ));
                ui.add_space(2.0);
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open local catalog…").clicked() {
                open_catalog_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export filtered JSON…").clicked() {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui.button("⟳ Refresh").clicked() {
            state.refresh();
        }

        ui.separator();

        if let Some(catalog) = &state.catalog {
            let mut info = format!(
                "{} events in catalog, {} shown",
                catalog.len(),
                state.visible_indices.len()
            );
            if catalog.skipped_rows > 0 {
                info.push_str(&format!(" ({} rows skipped)", catalog.skipped_rows));
            }
            ui.label(info);
        }

        if state.loading {
            ui.spinner();
            ui.label("fetching…");
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn open_catalog_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open catalog CSV")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open_local(&path);
    }
}

fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered events")
        .set_file_name("earthquakes.json")
        .save_file();

    if let Some(path) = file {
        if let Err(err) = state.export_json(&path) {
            log::error!("export failed: {err:#}");
            state.status_message = Some(format!("Export failed: {err:#}"));
        }
    }
}
