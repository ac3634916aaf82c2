use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points, Polygon};

use crate::color::Gradient;
use crate::data::model::{CellRecord, Metric};
use crate::state::AppState;

/// Number of colour buckets used when a scatter is coloured by a
/// continuous attribute (one `Points` series per bucket).
const GRADIENT_BUCKETS: usize = 24;

// ---------------------------------------------------------------------------
// Violin plot of genes-detected per batch
// ---------------------------------------------------------------------------

/// Per-batch violin (kernel density outline) of the genes-detected metric,
/// computed over the currently filtered cells.
pub fn violin_plot(ui: &mut Ui, state: &AppState, height: f32) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    // Group filtered values by batch, in configured condition order.
    let groups: Vec<(String, Vec<f64>)> = state
        .conditions()
        .iter()
        .filter_map(|label| {
            let values: Vec<f64> = state
                .view
                .indices
                .iter()
                .map(|&i| &dataset.cells[i])
                .filter(|cell| &cell.batch == label)
                .map(|cell| cell.genes_detected)
                .collect();
            (!values.is_empty()).then(|| (label.clone(), values))
        })
        .collect();

    ui.strong(Metric::GenesDetected.label());

    let labels: Vec<String> = groups.iter().map(|(l, _)| l.clone()).collect();
    Plot::new("qc_violin")
        .height(height)
        .y_axis_label(Metric::GenesDetected.label())
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            for (slot, (label, values)) in groups.iter().enumerate() {
                let color = state.batch_colors.color_for(label);
                let center = slot as f64;

                for shape in violin_outline(center, values) {
                    plot_ui.polygon(
                        Polygon::new(shape)
                            .fill_color(color.gamma_multiply(0.4))
                            .stroke(Stroke::new(1.0, color)),
                    );
                }

                // Quartile bar and median tick.
                let (q1, median, q3) = quartiles(values);
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![[center, q1], [center, q3]]))
                        .color(color)
                        .width(3.0),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![
                        [center - 0.15, median],
                        [center + 0.15, median],
                    ]))
                    .color(Color32::WHITE)
                    .width(2.0),
                );
            }
        });
}

/// Mirror-symmetric density outline around `center`, max half-width 0.4.
/// Returned as a list with a single polygon (or empty for degenerate data).
fn violin_outline(center: f64, values: &[f64]) -> Vec<PlotPoints> {
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(lo.is_finite() && hi.is_finite()) || (hi - lo).abs() < f64::EPSILON {
        return Vec::new();
    }

    let bandwidth = silverman_bandwidth(values).max((hi - lo) / 100.0);
    let steps = 41;
    let densities: Vec<(f64, f64)> = (0..steps)
        .map(|k| {
            let y = lo + (hi - lo) * k as f64 / (steps - 1) as f64;
            let d: f64 = values
                .iter()
                .map(|v| (-0.5 * ((y - v) / bandwidth).powi(2)).exp())
                .sum();
            (y, d)
        })
        .collect();

    let peak = densities.iter().map(|(_, d)| *d).fold(0.0, f64::max);
    if peak <= 0.0 {
        return Vec::new();
    }

    let mut outline: Vec<[f64; 2]> = Vec::with_capacity(steps * 2);
    for &(y, d) in &densities {
        outline.push([center - d / peak * 0.4, y]);
    }
    for &(y, d) in densities.iter().rev() {
        outline.push([center + d / peak * 0.4, y]);
    }
    vec![PlotPoints::from(outline)]
}

/// Silverman's rule-of-thumb kernel bandwidth.
fn silverman_bandwidth(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    1.06 * var.sqrt() * n.powf(-0.2)
}

fn quartiles(values: &[f64]) -> (f64, f64, f64) {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    (
        percentile(&sorted, 0.25),
        percentile(&sorted, 0.5),
        percentile(&sorted, 0.75),
    )
}

/// Linear-interpolated percentile of an already sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// ---------------------------------------------------------------------------
// UMAP scatter plots
// ---------------------------------------------------------------------------

/// What attribute colours the UMAP scatter points.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorBy {
    Batch,
    Metric(Metric),
    SScore,
    G2mScore,
    Gene(String),
}

impl ColorBy {
    pub fn title(&self) -> String {
        match self {
            ColorBy::Batch => "UMAP by batch".to_string(),
            ColorBy::Metric(m) => format!("UMAP by {}", m.label()),
            ColorBy::SScore => "UMAP by S score".to_string(),
            ColorBy::G2mScore => "UMAP by G2M score".to_string(),
            ColorBy::Gene(g) => format!("UMAP by {g} expression"),
        }
    }

    /// The continuous value this colouring reads from a cell, if any.
    fn value(&self, cell: &CellRecord) -> Option<f64> {
        match self {
            ColorBy::Batch => None,
            ColorBy::Metric(m) => Some(m.value(cell)),
            ColorBy::SScore => cell.s_score,
            ColorBy::G2mScore => cell.g2m_score,
            ColorBy::Gene(g) => cell.expression.get(g).copied(),
        }
    }
}

/// Render one UMAP scatter of the filtered cells, coloured per `color_by`.
pub fn umap_scatter(ui: &mut Ui, state: &AppState, id: &str, color_by: &ColorBy, height: f32) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    ui.strong(color_by.title());

    let plot = Plot::new(id.to_string())
        .height(height)
        .legend(Legend::default())
        .x_axis_label("umap1")
        .y_axis_label("umap2");

    match color_by {
        ColorBy::Batch => plot.show(ui, |plot_ui| {
            for label in state.conditions() {
                let points: Vec<[f64; 2]> = state
                    .view
                    .indices
                    .iter()
                    .map(|&i| &dataset.cells[i])
                    .filter(|cell| &cell.batch == label)
                    .map(|cell| cell.umap)
                    .collect();
                if points.is_empty() {
                    continue;
                }
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(label)
                        .color(state.batch_colors.color_for(label))
                        .radius(1.5),
                );
            }
        }),
        _ => {
            // Continuous colouring: bucket points along a gradient so each
            // bucket is one series.
            let mut valued: Vec<([f64; 2], f64)> = Vec::new();
            let mut missing: Vec<[f64; 2]> = Vec::new();
            for &i in &state.view.indices {
                let cell = &dataset.cells[i];
                match color_by.value(cell) {
                    Some(v) => valued.push((cell.umap, v)),
                    None => missing.push(cell.umap),
                }
            }
            let gradient = Gradient::from_values(valued.iter().map(|(_, v)| *v));

            let mut buckets: Vec<Vec<[f64; 2]>> = vec![Vec::new(); GRADIENT_BUCKETS];
            for (pos, v) in &valued {
                let bin = (gradient.position(*v) * (GRADIENT_BUCKETS - 1) as f64).round() as usize;
                buckets[bin].push(*pos);
            }

            plot.show(ui, |plot_ui| {
                if !missing.is_empty() {
                    plot_ui.points(
                        Points::new(PlotPoints::from(missing))
                            .name("n/a")
                            .color(Color32::DARK_GRAY)
                            .radius(1.5),
                    );
                }
                for (bin, points) in buckets.into_iter().enumerate() {
                    if points.is_empty() {
                        continue;
                    }
                    let t = bin as f64 / (GRADIENT_BUCKETS - 1) as f64;
                    let representative = gradient.position_inverse(t);
                    let mut series = Points::new(PlotPoints::from(points))
                        .color(gradient.color_at(representative))
                        .radius(1.5);
                    // Only label the ends so the legend stays readable.
                    if bin == 0 || bin == GRADIENT_BUCKETS - 1 {
                        series = series.name(format!("{representative:.2}"));
                    }
                    plot_ui.points(series);
                }
            })
        }
    };
}
