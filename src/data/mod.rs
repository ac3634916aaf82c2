/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  config.json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse metrics (+ optional UMAP) file → QcDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ QcDataset │  Vec<CellRecord>, batch / gene indices, QC bounds
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply batch + range predicates → view + summary
///   └──────────┘
/// ```

pub mod cell_cycle;
pub mod filter;
pub mod loader;
pub mod model;
