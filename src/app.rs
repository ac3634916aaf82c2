use eframe::egui::{self, ComboBox, ScrollArea, Ui};

use crate::data::model::Metric;
use crate::state::{AppState, Tab};
use crate::ui::plot::ColorBy;
use crate::ui::{panels, pie, plot};

const PLOT_HEIGHT: f32 = 300.0;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CellscopeApp {
    pub state: AppState,
}

impl CellscopeApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for CellscopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
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

        // ---- Central panel: tabbed plots ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open a dashboard config to explore QC metrics  (File → Open…)");
                });
                return;
            }

            ui.horizontal(|ui: &mut Ui| {
                ui.selectable_value(&mut self.state.tab, Tab::Qc, "QC");
                ui.selectable_value(&mut self.state.tab, Tab::CellCycle, "Cell cycle");
            });
            ui.separator();

            match self.state.tab {
                Tab::Qc => qc_tab(ui, &self.state),
                Tab::CellCycle => cell_cycle_tab(ui, &mut self.state),
            }
        });
    }
}

// ---------------------------------------------------------------------------
// QC tab: violin + pie, then UMAP scatters per metric
// ---------------------------------------------------------------------------

fn qc_tab(ui: &mut Ui, state: &AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.columns(2, |cols: &mut [Ui]| {
                plot::violin_plot(&mut cols[0], state, PLOT_HEIGHT);
                pie::pie_chart(&mut cols[1], &state.view.summary, &state.batch_colors);
            });
            ui.separator();

            ui.columns(2, |cols: &mut [Ui]| {
                plot::umap_scatter(&mut cols[0], state, "umap_batch", &ColorBy::Batch, PLOT_HEIGHT);
                plot::umap_scatter(
                    &mut cols[1],
                    state,
                    "umap_mito",
                    &ColorBy::Metric(Metric::PctMito),
                    PLOT_HEIGHT,
                );
            });
            ui.columns(2, |cols: &mut [Ui]| {
                plot::umap_scatter(
                    &mut cols[0],
                    state,
                    "umap_features",
                    &ColorBy::Metric(Metric::GenesDetected),
                    PLOT_HEIGHT,
                );
                plot::umap_scatter(
                    &mut cols[1],
                    state,
                    "umap_counts",
                    &ColorBy::Metric(Metric::TotalCounts),
                    PLOT_HEIGHT,
                );
            });
        });
}

// ---------------------------------------------------------------------------
// Cell-cycle tab: gene dropdowns, then scatters by expression and scores
// ---------------------------------------------------------------------------

fn cell_cycle_tab(ui: &mut Ui, state: &mut AppState) {
    // Gene selectors first (they mutate state), plots after.
    ui.horizontal(|ui: &mut Ui| {
        gene_selector(ui, "S-cycle gene", &state.s_genes.clone(), &mut state.s_gene);
        gene_selector(
            ui,
            "G2M-cycle gene",
            &state.g2m_genes.clone(),
            &mut state.g2m_gene,
        );
    });
    ui.separator();

    let state = &*state;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.columns(2, |cols: &mut [Ui]| {
                if let Some(gene) = &state.s_gene {
                    plot::umap_scatter(
                        &mut cols[0],
                        state,
                        "umap_s_gene",
                        &ColorBy::Gene(gene.clone()),
                        PLOT_HEIGHT,
                    );
                } else {
                    cols[0].label("No S-cycle marker genes in this dataset.");
                }
                if let Some(gene) = &state.g2m_gene {
                    plot::umap_scatter(
                        &mut cols[1],
                        state,
                        "umap_g2m_gene",
                        &ColorBy::Gene(gene.clone()),
                        PLOT_HEIGHT,
                    );
                } else {
                    cols[1].label("No G2M-cycle marker genes in this dataset.");
                }
            });
            ui.columns(2, |cols: &mut [Ui]| {
                plot::umap_scatter(
                    &mut cols[0],
                    state,
                    "umap_s_score",
                    &ColorBy::SScore,
                    PLOT_HEIGHT,
                );
                plot::umap_scatter(
                    &mut cols[1],
                    state,
                    "umap_g2m_score",
                    &ColorBy::G2mScore,
                    PLOT_HEIGHT,
                );
            });
        });
}

fn gene_selector(ui: &mut Ui, label: &str, choices: &[String], selected: &mut Option<String>) {
    let current = selected.clone().unwrap_or_else(|| "—".to_string());
    ComboBox::from_label(label)
        .selected_text(current.clone())
        .show_ui(ui, |ui: &mut Ui| {
            for gene in choices {
                if ui.selectable_label(current == *gene, gene).clicked() {
                    *selected = Some(gene.clone());
                }
            }
        });
}
