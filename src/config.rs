use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Dashboard configuration file
// ---------------------------------------------------------------------------

/// Startup configuration, read from a JSON file.
///
/// ```json
/// {
///   "path_metrics": "data/sample_data.parquet",
///   "conditions": ["ctrl_1", "ctrl_2", "treated_1"],
///   "col_features": "n_genes_by_counts",
///   "col_counts": "total_counts",
///   "col_mt": "pct_counts_mt"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Per-cell metrics table (.parquet, .csv or .json).
    pub path_metrics: PathBuf,
    /// Optional separate UMAP coordinate table, joined by row position.
    #[serde(default)]
    pub path_umap: Option<PathBuf>,
    /// Batch/condition labels offered in the filter panel.
    pub conditions: Vec<String>,
    /// Column holding the genes-detected count.
    pub col_features: String,
    /// Column holding the total read count.
    pub col_counts: String,
    /// Column holding the percent-mitochondrial fraction.
    pub col_mt: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("config lists no conditions")]
    NoConditions,
    #[error("QC column names must be distinct, got {0:?}")]
    DuplicateColumns([String; 3]),
}

/// Read and validate the configuration. Any failure here is fatal at
/// startup; the dashboard never serves without a valid config.
pub fn load_config(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: DashboardConfig =
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if config.conditions.is_empty() {
        return Err(ConfigError::NoConditions);
    }
    let cols = [
        config.col_features.clone(),
        config.col_counts.clone(),
        config.col_mt.clone(),
    ];
    if cols[0] == cols[1] || cols[0] == cols[2] || cols[1] == cols[2] {
        return Err(ConfigError::DuplicateColumns(cols));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_valid_config() {
        let file = write_config(
            r#"{
                "path_metrics": "data/cells.parquet",
                "conditions": ["ctrl", "treated"],
                "col_features": "n_genes_by_counts",
                "col_counts": "total_counts",
                "col_mt": "pct_counts_mt"
            }"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.conditions, vec!["ctrl", "treated"]);
        assert!(config.path_umap.is_none());
        assert_eq!(config.col_mt, "pct_counts_mt");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = write_config("{ not json");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn empty_condition_list_is_rejected() {
        let file = write_config(
            r#"{
                "path_metrics": "cells.csv",
                "conditions": [],
                "col_features": "a",
                "col_counts": "b",
                "col_mt": "c"
            }"#,
        );
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::NoConditions
        ));
    }

    #[test]
    fn duplicate_qc_columns_are_rejected() {
        let file = write_config(
            r#"{
                "path_metrics": "cells.csv",
                "conditions": ["a"],
                "col_features": "x",
                "col_counts": "x",
                "col_mt": "c"
            }"#,
        );
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::DuplicateColumns(_)
        ));
    }
}
