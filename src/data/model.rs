use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// CellRecord – one row of the metrics table
// ---------------------------------------------------------------------------

/// A single sequenced cell (one row of the source table).
#[derive(Debug, Clone)]
pub struct CellRecord {
    /// Batch / condition label.
    pub batch: String,
    /// Number of genes detected in the cell.
    pub genes_detected: f64,
    /// Total read count.
    pub total_counts: f64,
    /// Fraction of reads mapping to mitochondrial genes.
    pub pct_mito: f64,
    /// 2-D UMAP embedding position (display only, never filtered on).
    pub umap: [f64; 2],
    /// S-phase cell-cycle score, when present in the source.
    pub s_score: Option<f64>,
    /// G2M-phase cell-cycle score, when present in the source.
    pub g2m_score: Option<f64>,
    /// Per-gene expression levels: gene name → value.
    pub expression: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Metric – the three QC attributes the dashboard filters on
// ---------------------------------------------------------------------------

/// One of the three filterable QC metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    GenesDetected,
    TotalCounts,
    PctMito,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::GenesDetected, Metric::TotalCounts, Metric::PctMito];

    /// Read this metric's value out of a cell record.
    pub fn value(self, cell: &CellRecord) -> f64 {
        match self {
            Metric::GenesDetected => cell.genes_detected,
            Metric::TotalCounts => cell.total_counts,
            Metric::PctMito => cell.pct_mito,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::GenesDetected => "N genes by counts",
            Metric::TotalCounts => "Total counts",
            Metric::PctMito => "Percent mitochondrial genes",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// QcDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed label and gene indices.
/// Immutable after load; every interaction reads it, nothing mutates it.
#[derive(Debug, Clone)]
pub struct QcDataset {
    /// All cells (rows), in file order.
    pub cells: Vec<CellRecord>,
    /// Sorted unique batch labels observed in the data.
    pub batches: Vec<String>,
    /// Sorted gene names for which expression columns were present.
    pub genes: Vec<String>,
}

impl QcDataset {
    /// Build label and gene indices from the loaded cells.
    pub fn from_cells(cells: Vec<CellRecord>) -> Self {
        let mut batch_set: BTreeSet<&str> = BTreeSet::new();
        let mut gene_set: BTreeSet<&str> = BTreeSet::new();

        for cell in &cells {
            batch_set.insert(cell.batch.as_str());
            for gene in cell.expression.keys() {
                gene_set.insert(gene);
            }
        }
        let batches = batch_set.into_iter().map(String::from).collect();
        let genes = gene_set.into_iter().map(String::from).collect();
        QcDataset {
            cells,
            batches,
            genes,
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ---------------------------------------------------------------------------
// QcBounds – natural min/max of the three QC metrics
// ---------------------------------------------------------------------------

/// Observed [min, max] of a single metric across the full dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for MetricBounds {
    fn default() -> Self {
        MetricBounds { min: 0.0, max: 0.0 }
    }
}

/// Per-metric bounds, computed once at load to seed the slider ranges.
/// Never recomputed against filtered subsets.
#[derive(Debug, Clone, Copy, Default)]
pub struct QcBounds {
    pub genes_detected: MetricBounds,
    pub total_counts: MetricBounds,
    pub pct_mito: MetricBounds,
}

impl QcBounds {
    pub fn from_dataset(dataset: &QcDataset) -> Self {
        QcBounds {
            genes_detected: metric_bounds(dataset, Metric::GenesDetected),
            total_counts: metric_bounds(dataset, Metric::TotalCounts),
            pct_mito: metric_bounds(dataset, Metric::PctMito),
        }
    }

    pub fn for_metric(&self, metric: Metric) -> MetricBounds {
        match metric {
            Metric::GenesDetected => self.genes_detected,
            Metric::TotalCounts => self.total_counts,
            Metric::PctMito => self.pct_mito,
        }
    }
}

fn metric_bounds(dataset: &QcDataset, metric: Metric) -> MetricBounds {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for cell in &dataset.cells {
        let v = metric.value(cell);
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() {
        MetricBounds { min, max }
    } else {
        MetricBounds::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(batch: &str, genes: f64) -> CellRecord {
        CellRecord {
            batch: batch.to_string(),
            genes_detected: genes,
            total_counts: genes * 10.0,
            pct_mito: 0.1,
            umap: [0.0, 0.0],
            s_score: None,
            g2m_score: None,
            expression: BTreeMap::new(),
        }
    }

    #[test]
    fn from_cells_collects_sorted_unique_batches() {
        let ds = QcDataset::from_cells(vec![cell("b", 1.0), cell("a", 2.0), cell("b", 3.0)]);
        assert_eq!(ds.batches, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn from_cells_collects_gene_names() {
        let mut c = cell("a", 1.0);
        c.expression.insert("Top2a".to_string(), 0.5);
        c.expression.insert("Cdc45".to_string(), 1.5);
        let ds = QcDataset::from_cells(vec![c]);
        assert_eq!(ds.genes, vec!["Cdc45".to_string(), "Top2a".to_string()]);
    }

    #[test]
    fn bounds_cover_all_cells() {
        let ds = QcDataset::from_cells(vec![cell("a", 5.0), cell("a", 1.0), cell("b", 3.0)]);
        let bounds = QcBounds::from_dataset(&ds);
        assert_eq!(bounds.genes_detected, MetricBounds { min: 1.0, max: 5.0 });
        assert_eq!(bounds.total_counts, MetricBounds { min: 10.0, max: 50.0 });
    }

    #[test]
    fn bounds_of_empty_dataset_are_zero() {
        let ds = QcDataset::from_cells(Vec::new());
        let bounds = QcBounds::from_dataset(&ds);
        assert_eq!(bounds.pct_mito, MetricBounds::default());
    }
}
