use chrono::{DateTime, Utc};
use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};
use serde::Serialize;

use crate::data::model::Event;

// ---------------------------------------------------------------------------
// Tier – discrete magnitude bucket driving marker color and label
// ---------------------------------------------------------------------------

/// Magnitude tier. The mapping is total over the reals: any finite magnitude
/// lands in exactly one tier (negative micro-events included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tier {
    Major,
    Strong,
    Moderate,
    Light,
    Minor,
    Micro,
}

impl Tier {
    /// Strongest to weakest, for legends.
    pub const ALL: [Tier; 6] = [
        Tier::Major,
        Tier::Strong,
        Tier::Moderate,
        Tier::Light,
        Tier::Minor,
        Tier::Micro,
    ];

    pub fn for_magnitude(mag: f64) -> Tier {
        if mag >= 7.0 {
            Tier::Major
        } else if mag >= 6.0 {
            Tier::Strong
        } else if mag >= 5.0 {
            Tier::Moderate
        } else if mag >= 4.0 {
            Tier::Light
        } else if mag >= 3.0 {
            Tier::Minor
        } else {
            Tier::Micro
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Major => "Major (≥ 7.0)",
            Tier::Strong => "Strong (6.0–6.9)",
            Tier::Moderate => "Moderate (5.0–5.9)",
            Tier::Light => "Light (4.0–4.9)",
            Tier::Minor => "Minor (3.0–3.9)",
            Tier::Micro => "Micro (< 3.0)",
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            Tier::Major => Color32::from_rgb(139, 0, 0), // dark red
            Tier::Strong => Color32::from_rgb(229, 57, 53), // red
            Tier::Moderate => Color32::from_rgb(255, 140, 0), // orange
            Tier::Light => Color32::from_rgb(253, 216, 53), // yellow
            Tier::Minor => Color32::from_rgb(67, 160, 71), // green
            Tier::Micro => Color32::from_rgb(100, 181, 246), // light blue
        }
    }
}

/// Legend entries (label → color), strongest tier first.
pub fn legend_entries() -> Vec<(&'static str, Color32)> {
    Tier::ALL.iter().map(|t| (t.label(), t.color())).collect()
}

// ---------------------------------------------------------------------------
// Marker size
// ---------------------------------------------------------------------------

pub const MIN_MARKER_SIZE: f32 = 3.0;
pub const MAX_MARKER_SIZE: f32 = 20.0;

/// Marker radius for a magnitude: `mag * 3`, clamped to `[3, 20]`.
pub fn marker_size(mag: f64) -> f32 {
    ((mag * 3.0) as f32).clamp(MIN_MARKER_SIZE, MAX_MARKER_SIZE)
}

// ---------------------------------------------------------------------------
// Heatmap gradient
// ---------------------------------------------------------------------------

/// Color for a heatmap weight in `[0, 1]`: hue sweeps from blue (cold)
/// to red (hot).
pub fn heatmap_color(weight: f64) -> Color32 {
    let w = weight.clamp(0.0, 1.0) as f32;
    let hue = 240.0 * (1.0 - w);
    let hsl = Hsl::new(hue, 0.85, 0.5);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Heatmap weight for a magnitude. The feed tops out around M 8, so the
/// gradient is normalized against that.
pub fn heatmap_weight(mag: f64) -> f64 {
    (mag / 8.0).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// MapRecord – the encoded record handed to downstream consumers
// ---------------------------------------------------------------------------

/// One filtered, visually-encoded event, in the shape map and chart
/// consumers expect (and what Export → JSON writes).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: f64,
    pub place: String,
    pub time: DateTime<Utc>,
    pub tier: Tier,
    /// Tier color as `#rrggbb`, renderer-agnostic.
    pub tier_color: String,
    pub marker_size: f32,
}

impl MapRecord {
    /// Encode a single event. `None` when the event has no magnitude
    /// (such events never survive the filter anyway).
    pub fn from_event(ev: &Event) -> Option<MapRecord> {
        let magnitude = ev.magnitude?;
        let tier = Tier::for_magnitude(magnitude);
        Some(MapRecord {
            latitude: ev.latitude,
            longitude: ev.longitude,
            magnitude,
            place: ev.place.clone(),
            time: ev.time,
            tier,
            tier_color: color_hex(tier.color()),
            marker_size: marker_size(magnitude),
        })
    }
}

fn color_hex(c: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r(), c.g(), c.b())
}
