use std::collections::BTreeSet;

use super::model::{Metric, QcBounds, QcDataset};

// ---------------------------------------------------------------------------
// Filter criteria: selected batches plus three closed metric intervals
// ---------------------------------------------------------------------------

/// A closed numeric interval, inclusive on both ends.
/// Bounds are user-supplied and never validated against the data; an
/// inverted interval (`lo > hi`) simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricRange {
    pub lo: f64,
    pub hi: f64,
}

impl MetricRange {
    pub fn new(lo: f64, hi: f64) -> Self {
        MetricRange { lo, hi }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }
}

/// The complete filter state: which batches are selected and the interval
/// for each of the three QC metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub batches: BTreeSet<String>,
    pub genes_detected: MetricRange,
    pub total_counts: MetricRange,
    pub pct_mito: MetricRange,
}

impl FilterCriteria {
    /// Initialise criteria that pass every cell: all given batches selected,
    /// intervals spanning the dataset's natural bounds.
    pub fn passing_all(batches: impl IntoIterator<Item = String>, bounds: &QcBounds) -> Self {
        FilterCriteria {
            batches: batches.into_iter().collect(),
            genes_detected: MetricRange::new(bounds.genes_detected.min, bounds.genes_detected.max),
            total_counts: MetricRange::new(bounds.total_counts.min, bounds.total_counts.max),
            pct_mito: MetricRange::new(bounds.pct_mito.min, bounds.pct_mito.max),
        }
    }

    pub fn range_mut(&mut self, metric: Metric) -> &mut MetricRange {
        match metric {
            Metric::GenesDetected => &mut self.genes_detected,
            Metric::TotalCounts => &mut self.total_counts,
            Metric::PctMito => &mut self.pct_mito,
        }
    }
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Return indices of cells that pass all predicates.
///
/// A cell passes when:
/// * its batch label is in the selected set (empty set → nothing passes)
/// * each of the three QC metrics falls inside its inclusive interval
pub fn filtered_indices(dataset: &QcDataset, criteria: &FilterCriteria) -> Vec<usize> {
    dataset
        .cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| {
            criteria.batches.contains(&cell.batch)
                && criteria.genes_detected.contains(cell.genes_detected)
                && criteria.total_counts.contains(cell.total_counts)
                && criteria.pct_mito.contains(cell.pct_mito)
        })
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Category summary
// ---------------------------------------------------------------------------

/// Per-batch share of the filtered subset, for the pie chart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategorySummary {
    /// (batch label, percentage of the subset 0–100), batches with zero
    /// cells in the subset omitted.
    pub shares: Vec<(String, f64)>,
    /// Total number of cells in the subset.
    pub total: usize,
}

/// Group the filtered subset by batch and compute each batch's percentage
/// share. An empty subset reports zero categories and a total of zero
/// rather than dividing by zero.
pub fn summarize(dataset: &QcDataset, indices: &[usize]) -> CategorySummary {
    let total = indices.len();
    if total == 0 {
        return CategorySummary::default();
    }

    let mut counts: Vec<(String, usize)> = dataset
        .batches
        .iter()
        .map(|b| (b.clone(), 0usize))
        .collect();
    for &i in indices {
        let batch = &dataset.cells[i].batch;
        if let Some(entry) = counts.iter_mut().find(|(b, _)| b == batch) {
            entry.1 += 1;
        }
    }

    let shares = counts
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(b, n)| (b, n as f64 / total as f64 * 100.0))
        .collect();

    CategorySummary { shares, total }
}

// ---------------------------------------------------------------------------
// compute_view – the one operation the presentation layer calls
// ---------------------------------------------------------------------------

/// The filtered subset plus its category summary. Derived on demand from
/// (dataset, criteria); carries no state of its own.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilteredView {
    pub indices: Vec<usize>,
    pub summary: CategorySummary,
}

/// Apply the criteria and summarise the result. Pure: identical inputs
/// always produce identical output.
pub fn compute_view(dataset: &QcDataset, criteria: &FilterCriteria) -> FilteredView {
    let indices = filtered_indices(dataset, criteria);
    let summary = summarize(dataset, &indices);
    FilteredView { indices, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellRecord;
    use std::collections::BTreeMap;

    /// Four cells: batches [A, A, B, B], genes-detected [1, 2, 3, 4].
    fn four_cell_dataset() -> QcDataset {
        let cells = [("A", 1.0), ("A", 2.0), ("B", 3.0), ("B", 4.0)]
            .iter()
            .map(|&(batch, genes)| CellRecord {
                batch: batch.to_string(),
                genes_detected: genes,
                total_counts: 100.0,
                pct_mito: 0.05,
                umap: [0.0, 0.0],
                s_score: None,
                g2m_score: None,
                expression: BTreeMap::new(),
            })
            .collect();
        QcDataset::from_cells(cells)
    }

    fn criteria(batches: &[&str], genes: MetricRange) -> FilterCriteria {
        FilterCriteria {
            batches: batches.iter().map(|b| b.to_string()).collect(),
            genes_detected: genes,
            total_counts: MetricRange::new(0.0, 1000.0),
            pct_mito: MetricRange::new(0.0, 1.0),
        }
    }

    #[test]
    fn full_selection_returns_all_rows_with_even_split() {
        let ds = four_cell_dataset();
        let view = compute_view(&ds, &criteria(&["A", "B"], MetricRange::new(1.0, 4.0)));
        assert_eq!(view.indices, vec![0, 1, 2, 3]);
        assert_eq!(view.summary.total, 4);
        assert_eq!(
            view.summary.shares,
            vec![("A".to_string(), 50.0), ("B".to_string(), 50.0)]
        );
    }

    #[test]
    fn single_batch_selection_ignores_other_batches() {
        let ds = four_cell_dataset();
        let view = compute_view(&ds, &criteria(&["A"], MetricRange::new(0.0, 100.0)));
        assert_eq!(view.indices, vec![0, 1]);
        assert_eq!(view.summary.shares, vec![("A".to_string(), 100.0)]);
    }

    #[test]
    fn inverted_interval_yields_empty_view() {
        let ds = four_cell_dataset();
        let view = compute_view(&ds, &criteria(&["A", "B"], MetricRange::new(5.0, 1.0)));
        assert!(view.indices.is_empty());
        assert_eq!(view.summary, CategorySummary::default());
    }

    #[test]
    fn empty_batch_selection_yields_empty_view() {
        let ds = four_cell_dataset();
        let view = compute_view(&ds, &criteria(&[], MetricRange::new(1.0, 4.0)));
        assert!(view.indices.is_empty());
        assert_eq!(view.summary.total, 0);
        assert!(view.summary.shares.is_empty());
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        let ds = four_cell_dataset();
        let view = compute_view(&ds, &criteria(&["A", "B"], MetricRange::new(2.0, 3.0)));
        assert_eq!(view.indices, vec![1, 2]);
    }

    #[test]
    fn compute_view_is_deterministic() {
        let ds = four_cell_dataset();
        let c = criteria(&["A", "B"], MetricRange::new(1.5, 3.5));
        assert_eq!(compute_view(&ds, &c), compute_view(&ds, &c));
    }

    #[test]
    fn filtered_indices_are_a_subset_of_the_dataset() {
        let ds = four_cell_dataset();
        let view = compute_view(&ds, &criteria(&["B"], MetricRange::new(0.0, 10.0)));
        assert!(view.indices.iter().all(|&i| i < ds.len()));
    }

    #[test]
    fn shares_sum_to_one_hundred_when_nonempty() {
        let ds = four_cell_dataset();
        let view = compute_view(&ds, &criteria(&["A", "B"], MetricRange::new(1.0, 3.0)));
        let sum: f64 = view.summary.shares.iter().map(|(_, pct)| pct).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }
}
