use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellRecord, QcDataset};
use crate::config::DashboardConfig;

// Well-known column names, matching what scanpy exports.
pub const COL_BATCH: &str = "batch";
pub const COL_UMAP_X: &str = "X_umap-0";
pub const COL_UMAP_Y: &str = "X_umap-1";
pub const COL_S_SCORE: &str = "S_score";
pub const COL_G2M_SCORE: &str = "G2M_score";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the per-cell QC dataset described by the config.
///
/// The metrics table must carry a `batch` column, the three QC columns the
/// config names, and UMAP coordinates — either inline (`X_umap-0` /
/// `X_umap-1`) or in a second table (`path_umap`) joined by row position.
/// Every other numeric column is kept as per-gene expression; non-numeric
/// extras (e.g. a pandas index column) are ignored.
pub fn load_dataset(config: &DashboardConfig) -> Result<QcDataset> {
    let mut rows = load_table(&config.path_metrics)
        .with_context(|| format!("loading metrics table {}", config.path_metrics.display()))?;

    if let Some(umap_path) = &config.path_umap {
        let coords = load_table(umap_path)
            .with_context(|| format!("loading UMAP table {}", umap_path.display()))?;
        join_coordinates(&mut rows, coords)?;
    }

    if rows.is_empty() {
        bail!(
            "metrics table {} contains no cells",
            config.path_metrics.display()
        );
    }

    let cells = assemble(config, rows)?;
    Ok(QcDataset::from_cells(cells))
}

// ---------------------------------------------------------------------------
// Intermediate row representation shared by all formats
// ---------------------------------------------------------------------------

/// One parsed table row before column names are mapped onto `CellRecord`.
#[derive(Debug, Default)]
struct RawRow {
    batch: Option<String>,
    numeric: BTreeMap<String, f64>,
}

/// Parse a tabular file. Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` / `.pq` – scanpy's `obs` table exported with `to_parquet`
/// * `.csv`             – header row with column names
/// * `.json`            – `[{ "batch": "...", "total_counts": 1234.0, ... }]`
fn load_table(path: &Path) -> Result<Vec<RawRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "csv" => load_csv(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Copy UMAP coordinates from a second table into the metrics rows,
/// matching purely by row position.
fn join_coordinates(rows: &mut [RawRow], coords: Vec<RawRow>) -> Result<()> {
    if coords.len() != rows.len() {
        bail!(
            "UMAP table has {} rows but metrics table has {}",
            coords.len(),
            rows.len()
        );
    }
    for (i, (row, coord)) in rows.iter_mut().zip(coords).enumerate() {
        for name in [COL_UMAP_X, COL_UMAP_Y] {
            let value = coord
                .numeric
                .get(name)
                .copied()
                .with_context(|| format!("UMAP table row {i}: missing '{name}' column"))?;
            row.numeric.insert(name.to_string(), value);
        }
    }
    Ok(())
}

/// Map raw rows onto `CellRecord`s using the configured QC column names.
fn assemble(config: &DashboardConfig, rows: Vec<RawRow>) -> Result<Vec<CellRecord>> {
    rows.into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            let mut required = |name: &str| {
                row.numeric
                    .remove(name)
                    .with_context(|| format!("row {i}: missing numeric column '{name}'"))
            };

            let genes_detected = required(config.col_features.as_str())?;
            let total_counts = required(config.col_counts.as_str())?;
            let pct_mito = required(config.col_mt.as_str())?;
            let umap_x = required(COL_UMAP_X)
                .context("UMAP coordinates must come from the metrics table or path_umap")?;
            let umap_y = required(COL_UMAP_Y)
                .context("UMAP coordinates must come from the metrics table or path_umap")?;

            let s_score = row.numeric.remove(COL_S_SCORE);
            let g2m_score = row.numeric.remove(COL_G2M_SCORE);
            let batch = row
                .batch
                .with_context(|| format!("row {i}: missing '{COL_BATCH}' label"))?;

            Ok(CellRecord {
                batch,
                genes_detected,
                total_counts,
                pct_mito,
                umap: [umap_x, umap_y],
                s_score,
                g2m_score,
                // Whatever numeric columns remain are gene expression levels.
                expression: row.numeric,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

fn load_parquet(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let first = rows.len();
        rows.extend((0..batch.num_rows()).map(|_| RawRow::default()));

        for (col_idx, field) in schema.fields().iter().enumerate() {
            let column = batch.column(col_idx);
            if field.name() == COL_BATCH {
                for (offset, row) in rows[first..].iter_mut().enumerate() {
                    row.batch = string_value(column, offset);
                }
            } else {
                // Non-numeric extras (index columns etc.) fall through here
                // with None and are simply dropped.
                for (offset, row) in rows[first..].iter_mut().enumerate() {
                    if let Some(v) = numeric_value(column, offset) {
                        row.numeric.insert(field.name().clone(), v);
                    }
                }
            }
        }
    }

    Ok(rows)
}

/// Read a single string cell from a Utf8 or LargeUtf8 column.
fn string_value(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|arr| arr.value(row).to_string()),
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            Some(arr.value(row).to_string())
        }
        _ => None,
    }
}

/// Read a single numeric cell, widening ints and f32 to f64.
fn numeric_value(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|arr| arr.value(row)),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|arr| arr.value(row) as f64),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|arr| arr.value(row) as f64),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|arr| arr.value(row) as f64),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one cell per data row.
/// The `batch` column is text; every other parseable-as-float cell is kept
/// as a numeric column.
fn load_csv(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let batch_idx = headers.iter().position(|h| h == COL_BATCH);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut row = RawRow::default();
        for (col_idx, field) in record.iter().enumerate() {
            if Some(col_idx) == batch_idx {
                row.batch = Some(field.to_string());
            } else if let Ok(v) = field.trim().parse::<f64>() {
                row.numeric.insert(headers[col_idx].clone(), v);
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
/// a top-level array of flat objects with one scalar per column.
fn load_json(path: &Path) -> Result<Vec<RawRow>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = RawRow::default();
        for (key, val) in obj {
            if key == COL_BATCH {
                row.batch = val.as_str().map(String::from);
            } else if let Some(v) = val.as_f64() {
                row.numeric.insert(key.clone(), v);
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn test_config(path_metrics: PathBuf, path_umap: Option<PathBuf>) -> DashboardConfig {
        DashboardConfig {
            path_metrics,
            path_umap,
            conditions: vec!["ctrl".to_string(), "treated".to_string()],
            col_features: "n_genes_by_counts".to_string(),
            col_counts: "total_counts".to_string(),
            col_mt: "pct_counts_mt".to_string(),
        }
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_a_complete_csv_table() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = write_file(
            &dir,
            "cells.csv",
            "batch,n_genes_by_counts,total_counts,pct_counts_mt,X_umap-0,X_umap-1,S_score,Cdc45\n\
             ctrl,1200,35000,0.04,1.5,-2.0,0.3,0.9\n\
             treated,800,21000,0.12,-0.5,3.1,-0.1,0.0\n",
        );
        let ds = load_dataset(&test_config(metrics, None)).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.batches, vec!["ctrl".to_string(), "treated".to_string()]);
        assert_eq!(ds.genes, vec!["Cdc45".to_string()]);

        let cell = &ds.cells[0];
        assert_eq!(cell.genes_detected, 1200.0);
        assert_eq!(cell.umap, [1.5, -2.0]);
        assert_eq!(cell.s_score, Some(0.3));
        assert_eq!(cell.g2m_score, None);
        assert_eq!(cell.expression.get("Cdc45"), Some(&0.9));
    }

    #[test]
    fn joins_umap_coordinates_by_row_position() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = write_file(
            &dir,
            "cells.csv",
            "batch,n_genes_by_counts,total_counts,pct_counts_mt\n\
             ctrl,1200,35000,0.04\n\
             ctrl,900,28000,0.07\n",
        );
        let umap = write_file(
            &dir,
            "umap.csv",
            "X_umap-0,X_umap-1\n0.1,0.2\n0.3,0.4\n",
        );
        let ds = load_dataset(&test_config(metrics, Some(umap))).unwrap();
        assert_eq!(ds.cells[0].umap, [0.1, 0.2]);
        assert_eq!(ds.cells[1].umap, [0.3, 0.4]);
    }

    #[test]
    fn umap_row_count_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = write_file(
            &dir,
            "cells.csv",
            "batch,n_genes_by_counts,total_counts,pct_counts_mt\nctrl,1,2,0.1\n",
        );
        let umap = write_file(&dir, "umap.csv", "X_umap-0,X_umap-1\n0.1,0.2\n0.3,0.4\n");
        let err = load_dataset(&test_config(metrics, Some(umap))).unwrap_err();
        assert!(err.to_string().contains("2 rows"));
    }

    #[test]
    fn missing_qc_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = write_file(
            &dir,
            "cells.csv",
            "batch,total_counts,pct_counts_mt,X_umap-0,X_umap-1\nctrl,2,0.1,0.0,0.0\n",
        );
        let err = load_dataset(&test_config(metrics, None)).unwrap_err();
        assert!(format!("{err:#}").contains("n_genes_by_counts"));
    }

    #[test]
    fn missing_coordinates_everywhere_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = write_file(
            &dir,
            "cells.csv",
            "batch,n_genes_by_counts,total_counts,pct_counts_mt\nctrl,1,2,0.1\n",
        );
        let err = load_dataset(&test_config(metrics, None)).unwrap_err();
        assert!(format!("{err:#}").contains("path_umap"));
    }

    #[test]
    fn empty_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = write_file(
            &dir,
            "cells.csv",
            "batch,n_genes_by_counts,total_counts,pct_counts_mt,X_umap-0,X_umap-1\n",
        );
        let err = load_dataset(&test_config(metrics, None)).unwrap_err();
        assert!(err.to_string().contains("no cells"));
    }

    #[test]
    fn loads_records_oriented_json() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = write_file(
            &dir,
            "cells.json",
            r#"[
                {"batch": "ctrl", "n_genes_by_counts": 1500, "total_counts": 40000,
                 "pct_counts_mt": 0.03, "X_umap-0": 1.0, "X_umap-1": 2.0,
                 "G2M_score": 0.7, "barcode": "AAACCTG"}
            ]"#,
        );
        let ds = load_dataset(&test_config(metrics, None)).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.cells[0].g2m_score, Some(0.7));
        // Non-numeric extras are dropped, not turned into genes.
        assert!(ds.genes.is_empty());
    }

    #[test]
    fn loads_a_parquet_table() {
        use arrow::array::{Float64Array, Int64Array, StringArray};
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("batch", DataType::Utf8, false),
            Field::new("n_genes_by_counts", DataType::Int64, false),
            Field::new("total_counts", DataType::Float64, false),
            Field::new("pct_counts_mt", DataType::Float64, false),
            Field::new("X_umap-0", DataType::Float64, false),
            Field::new("X_umap-1", DataType::Float64, false),
            Field::new("Top2a", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["ctrl", "treated"])),
                Arc::new(Int64Array::from(vec![1000, 2000])),
                Arc::new(Float64Array::from(vec![30000.0, 55000.0])),
                Arc::new(Float64Array::from(vec![0.05, 0.2])),
                Arc::new(Float64Array::from(vec![0.0, 1.0])),
                Arc::new(Float64Array::from(vec![0.0, -1.0])),
                Arc::new(Float64Array::from(vec![0.4, 1.3])),
            ],
        )
        .unwrap();

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_dataset(&test_config(path, None)).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.cells[1].batch, "treated");
        assert_eq!(ds.cells[1].genes_detected, 2000.0);
        assert_eq!(ds.genes, vec!["Top2a".to_string()]);
    }
}
