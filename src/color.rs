use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Categorical mapping: batch label → Color32
// ---------------------------------------------------------------------------

/// Maps batch labels to distinct colours.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map over the given labels.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let palette = generate_palette(labels.len());
        ColorMap {
            mapping: labels.into_iter().zip(palette).collect(),
        }
    }

    /// Look up the colour for a batch label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping.get(label).copied().unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Continuous mapping: metric / score / expression value → Color32
// ---------------------------------------------------------------------------

/// A cold-to-warm colour ramp over a closed value range, for colouring
/// scatter points by a continuous attribute.
#[derive(Debug, Clone, Copy)]
pub struct Gradient {
    lo: f64,
    hi: f64,
}

impl Gradient {
    pub fn new(lo: f64, hi: f64) -> Self {
        Gradient { lo, hi }
    }

    /// Fit a ramp to the observed values; degenerate ranges collapse to a
    /// single colour.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in values {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if lo.is_finite() && hi.is_finite() {
            Gradient::new(lo, hi)
        } else {
            Gradient::new(0.0, 0.0)
        }
    }

    /// Normalised position of `value` in the range, clamped to [0, 1].
    pub fn position(&self, value: f64) -> f64 {
        let span = self.hi - self.lo;
        if span.abs() < f64::EPSILON {
            return 0.5;
        }
        ((value - self.lo) / span).clamp(0.0, 1.0)
    }

    /// Value at normalised position `t` in the range (inverse of
    /// [`Gradient::position`]).
    pub fn position_inverse(&self, t: f64) -> f64 {
        self.lo + t * (self.hi - self.lo)
    }

    /// Colour for a value: deep blue at the low end through to yellow at
    /// the high end.
    pub fn color_at(&self, value: f64) -> Color32 {
        let t = self.position(value) as f32;
        // Hue sweep 250° (blue) → 55° (yellow), brightening as it warms.
        let hue = 250.0 - t * 195.0;
        hsl_to_color32(Hsl::new(hue, 0.85, 0.35 + 0.25 * t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_length_and_distinct_colors() {
        let palette = generate_palette(6);
        assert_eq!(palette.len(), 6);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn color_map_falls_back_to_gray_for_unknown_labels() {
        let cm = ColorMap::new(["ctrl", "treated"]);
        assert_ne!(cm.color_for("ctrl"), cm.color_for("treated"));
        assert_eq!(cm.color_for("other"), Color32::GRAY);
    }

    #[test]
    fn gradient_positions_clamp_to_unit_range() {
        let g = Gradient::new(10.0, 20.0);
        assert_eq!(g.position(10.0), 0.0);
        assert_eq!(g.position(20.0), 1.0);
        assert_eq!(g.position(5.0), 0.0);
        assert_eq!(g.position(25.0), 1.0);
    }

    #[test]
    fn degenerate_gradient_is_a_single_color() {
        let g = Gradient::from_values([3.0, 3.0, 3.0]);
        assert_eq!(g.color_at(3.0), g.color_at(100.0));
    }
}
