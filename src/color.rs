use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| hsl_color(((i as f32 / n as f32) * 360.0 + 210.0) % 360.0, 0.75, 0.55))
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category / region name → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a grouping column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the column's distinct values, in display order.
    pub fn new(values: &[String]) -> Self {
        let palette = generate_palette(values.len());
        let mapping = values.iter().cloned().zip(palette).collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Continuous scales for numeric colouring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScale {
    /// Dark purple through blue and green to yellow.
    Viridis,
    /// Red through yellow to green.
    RedYellowGreen,
}

impl ColorScale {
    /// Colour at position `t` in `[0, 1]`; out-of-range values are clamped.
    pub fn color_at(self, t: f64) -> Color32 {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) as f32 } else { 0.5 };
        match self {
            ColorScale::Viridis => hsl_color(280.0 - 220.0 * t, 0.7, 0.3 + 0.3 * t),
            ColorScale::RedYellowGreen => hsl_color(120.0 * t, 0.75, 0.45),
        }
    }

    /// Colour for `value` positioned linearly between `min` and `max`.
    pub fn color_in_range(self, value: f64, min: f64, max: f64) -> Color32 {
        let span = max - min;
        if span.abs() < f64::EPSILON {
            return self.color_at(0.5);
        }
        self.color_at((value - min) / span)
    }
}
