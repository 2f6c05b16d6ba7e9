use std::time::Duration;

use chrono::Utc;
use eframe::egui;

use crate::state::AppState;
use crate::ui::{charts, map, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct QuakeMapApp {
    pub state: AppState,
}

impl Default for QuakeMapApp {
    fn default() -> Self {
        Self {
            state: AppState::default(),
        }
    }
}

impl eframe::App for QuakeMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Collect finished fetches and trigger a refetch once the cached
        // snapshot goes stale.
        self.state.tick(Utc::now());
        if self.state.loading {
            ctx.request_repaint_after(Duration::from_millis(150));
        } else {
            // Wake up periodically so TTL expiry is noticed without input.
            ctx.request_repaint_after(Duration::from_secs(30));
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: charts ----
        egui::TopBottomPanel::bottom("charts_panel")
            .default_height(200.0)
            .resizable(true)
            .show(ctx, |ui| {
                charts::charts_panel(ui, &self.state);
            });

        // ---- Central panel: map ----
        egui::CentralPanel::default().show(ctx, |ui| {
            map::map_panel(ui, &self.state);
        });
    }
}
