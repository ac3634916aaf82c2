use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};

use crate::data::model::Metric;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel: batch checkboxes plus the three QC range
/// controls, seeded from the dataset's natural bounds.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // Clone so we can mutate state inside the loop.
    let conditions: Vec<String> = state.conditions().to_vec();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Batch selection ----
            ui.strong("Batches");
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all_batches();
                }
                if ui.small_button("None").clicked() {
                    state.select_no_batches();
                }
            });

            for label in &conditions {
                let mut checked = state.criteria.batches.contains(label);
                let text = RichText::new(label).color(state.batch_colors.color_for(label));
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_batch(label);
                }
            }
            ui.separator();

            // ---- QC metric ranges ----
            for metric in Metric::ALL {
                metric_range_widget(ui, state, metric);
                ui.separator();
            }
        });

    // Recompute the view after any control changes.
    state.refilter();
}

/// Min/max editors for one QC metric. Values are not clamped: inverted or
/// out-of-range intervals are legitimate (possibly empty-yielding) filters.
fn metric_range_widget(ui: &mut Ui, state: &mut AppState, metric: Metric) {
    let bounds = state.bounds.for_metric(metric);
    let speed = ((bounds.max - bounds.min).abs() / 200.0).max(0.001);

    ui.strong(metric.label());
    let range = state.criteria.range_mut(metric);
    ui.horizontal(|ui: &mut Ui| {
        ui.label("min");
        ui.add(DragValue::new(&mut range.lo).speed(speed));
        ui.label("max");
        ui.add(DragValue::new(&mut range.hi).speed(speed));
    });
    if ui.small_button("Reset").clicked() {
        range.lo = bounds.min;
        range.hi = bounds.max;
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open config…").clicked() {
                open_config_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} cells loaded, {} passing filters",
                ds.len(),
                state.view.indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_config_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open dashboard config")
        .add_filter("Config", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.reload_from_config_file(&path);
    }
}
