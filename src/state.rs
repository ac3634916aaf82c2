use std::path::Path;

use anyhow::{Context, Result};

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::cell_cycle;
use crate::data::filter::{compute_view, FilterCriteria, FilteredView};
use crate::data::loader;
use crate::data::model::{QcBounds, QcDataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which plot tab is shown in the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Qc,
    CellCycle,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Active configuration (None until a config is loaded).
    pub config: Option<DashboardConfig>,

    /// Loaded dataset; immutable once set, shared by every interaction.
    pub dataset: Option<QcDataset>,

    /// Natural [min, max] of the three QC metrics, computed once at load
    /// to seed the range controls.
    pub bounds: QcBounds,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Filtered view for the current criteria (cached; rebuilt by
    /// [`AppState::refilter`]).
    pub view: FilteredView,

    /// Batch label → colour, over the configured conditions.
    pub batch_colors: ColorMap,

    /// Cell-cycle genes present in the dataset, dropdown choices.
    pub s_genes: Vec<String>,
    pub g2m_genes: Vec<String>,

    /// Currently selected cell-cycle genes.
    pub s_gene: Option<String>,
    pub g2m_gene: Option<String>,

    pub tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            config: None,
            dataset: None,
            bounds: QcBounds::default(),
            criteria: FilterCriteria::passing_all([], &QcBounds::default()),
            view: FilteredView::default(),
            batch_colors: ColorMap::default(),
            s_genes: Vec::new(),
            g2m_genes: Vec::new(),
            s_gene: None,
            g2m_gene: None,
            tab: Tab::Qc,
            status_message: None,
        }
    }
}

impl AppState {
    /// Build the state from a config file: read config, load the dataset,
    /// seed filters from its bounds. Used at startup, where any failure
    /// is fatal.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = crate::config::load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?;
        let dataset = loader::load_dataset(&config)?;
        let mut state = AppState::default();
        state.set_dataset(config, dataset);
        Ok(state)
    }

    /// Same as [`AppState::from_config_file`] but non-fatal: failures land
    /// in `status_message`. Used by the File → Open dialog.
    pub fn reload_from_config_file(&mut self, path: &Path) {
        match AppState::from_config_file(path) {
            Ok(state) => *self = state,
            Err(e) => {
                log::error!("Failed to load config: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset, initialise bounds, filters, colours
    /// and gene choices.
    pub fn set_dataset(&mut self, config: DashboardConfig, dataset: QcDataset) {
        self.bounds = QcBounds::from_dataset(&dataset);
        self.criteria = FilterCriteria::passing_all(config.conditions.iter().cloned(), &self.bounds);
        self.batch_colors = ColorMap::new(config.conditions.iter().cloned());

        self.s_genes = to_owned(cell_cycle::available(cell_cycle::S_GENES, &dataset.genes));
        self.g2m_genes = to_owned(cell_cycle::available(cell_cycle::G2M_GENES, &dataset.genes));
        self.s_gene = pick_default("Cdc45", &self.s_genes);
        self.g2m_gene = pick_default("Top2a", &self.g2m_genes);

        self.view = compute_view(&dataset, &self.criteria);
        log::info!(
            "Loaded {} cells, {} batches, {} gene columns",
            dataset.len(),
            dataset.batches.len(),
            dataset.genes.len()
        );

        self.config = Some(config);
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Batch labels offered in the filter panel (the configured conditions).
    pub fn conditions(&self) -> &[String] {
        self.config.as_ref().map(|c| c.conditions.as_slice()).unwrap_or(&[])
    }

    /// Recompute the cached view after a criteria change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.view = compute_view(ds, &self.criteria);
        }
    }

    /// Toggle a single batch label in the selection.
    pub fn toggle_batch(&mut self, label: &str) {
        if !self.criteria.batches.remove(label) {
            self.criteria.batches.insert(label.to_string());
        }
        self.refilter();
    }

    /// Select every configured condition.
    pub fn select_all_batches(&mut self) {
        self.criteria.batches = self.conditions().iter().cloned().collect();
        self.refilter();
    }

    /// Clear the batch selection (yields an empty view).
    pub fn select_no_batches(&mut self) {
        self.criteria.batches.clear();
        self.refilter();
    }
}

fn to_owned(genes: Vec<&str>) -> Vec<String> {
    genes.into_iter().map(String::from).collect()
}

fn pick_default(preferred: &str, choices: &[String]) -> Option<String> {
    if choices.iter().any(|g| g == preferred) {
        Some(preferred.to_string())
    } else {
        choices.first().cloned()
    }
}
