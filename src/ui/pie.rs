use eframe::egui::{Color32, Sense, Shape, Stroke, Ui, Vec2};

use crate::color::ColorMap;
use crate::data::filter::CategorySummary;

/// Angular step used to fan a pie sector into convex triangles.
const SECTOR_STEP: f32 = 0.05;

// ---------------------------------------------------------------------------
// Category pie chart
// ---------------------------------------------------------------------------

/// Draw the batch-share pie for the current filtered subset, titled with
/// the total cell count. An empty subset renders an empty outline.
pub fn pie_chart(ui: &mut Ui, summary: &CategorySummary, colors: &ColorMap) {
    ui.strong(format!(
        "Percentage of categories (total cells: {})",
        summary.total
    ));

    let side = ui.available_width().clamp(120.0, 240.0);
    let (response, painter) = ui.allocate_painter(Vec2::splat(side), Sense::hover());
    let center = response.rect.center();
    let radius = side * 0.45;

    if summary.total == 0 {
        painter.circle_stroke(center, radius, Stroke::new(1.0, Color32::DARK_GRAY));
    } else {
        // Start at 12 o'clock, sweep clockwise.
        let mut angle = -std::f32::consts::FRAC_PI_2;
        for (label, pct) in &summary.shares {
            let sweep = (*pct as f32 / 100.0) * std::f32::consts::TAU;
            let color = colors.color_for(label);

            let mut a = 0.0f32;
            while a < sweep {
                let b = (a + SECTOR_STEP).min(sweep);
                let p0 = center + radius * Vec2::new((angle + a).cos(), (angle + a).sin());
                let p1 = center + radius * Vec2::new((angle + b).cos(), (angle + b).sin());
                painter.add(Shape::convex_polygon(
                    vec![center, p0, p1],
                    color,
                    Stroke::NONE,
                ));
                a = b;
            }
            angle += sweep;
        }
    }

    // Legend: swatch + label + share.
    for (label, pct) in &summary.shares {
        ui.horizontal(|ui: &mut Ui| {
            let (swatch, painter) = ui.allocate_painter(Vec2::splat(10.0), Sense::hover());
            painter.rect_filled(swatch.rect, 2.0, colors.color_for(label));
            ui.label(format!("{label} — {pct:.1}%"));
        });
    }
}
