use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct BatchProfile {
    name: &'static str,
    umap_center: (f64, f64),
    mean_genes: f64,
    mean_counts: f64,
    mean_mito: f64,
}

const BATCHES: [BatchProfile; 3] = [
    BatchProfile {
        name: "ctrl_1",
        umap_center: (-3.0, -1.0),
        mean_genes: 2400.0,
        mean_counts: 52000.0,
        mean_mito: 0.05,
    },
    BatchProfile {
        name: "ctrl_2",
        umap_center: (-1.0, 2.5),
        mean_genes: 2100.0,
        mean_counts: 47000.0,
        mean_mito: 0.07,
    },
    BatchProfile {
        name: "treated_1",
        umap_center: (3.0, 0.5),
        mean_genes: 1600.0,
        mean_counts: 31000.0,
        mean_mito: 0.14,
    },
];

const CELLS_PER_BATCH: usize = 400;

/// Gene expression columns included in the sample: a few S-phase and
/// G2M-phase markers so the cell-cycle tab has something to show.
const S_MARKERS: [&str; 3] = ["Cdc45", "Mcm5", "Pcna"];
const G2M_MARKERS: [&str; 3] = ["Top2a", "Aurka", "Mki67"];

fn main() {
    let mut rng = SimpleRng::new(42);

    let n = BATCHES.len() * CELLS_PER_BATCH;
    let mut batch = Vec::with_capacity(n);
    let mut genes = Vec::with_capacity(n);
    let mut counts = Vec::with_capacity(n);
    let mut mito = Vec::with_capacity(n);
    let mut umap_x = Vec::with_capacity(n);
    let mut umap_y = Vec::with_capacity(n);
    let mut s_score = Vec::with_capacity(n);
    let mut g2m_score = Vec::with_capacity(n);
    let mut expression: Vec<Vec<f64>> = vec![Vec::with_capacity(n); 6];

    for profile in &BATCHES {
        for _ in 0..CELLS_PER_BATCH {
            batch.push(profile.name.to_string());
            genes.push(rng.gauss(profile.mean_genes, profile.mean_genes * 0.2).max(200.0) as i64);
            counts.push(rng.gauss(profile.mean_counts, profile.mean_counts * 0.25).max(1000.0));
            mito.push(rng.gauss(profile.mean_mito, 0.03).clamp(0.0, 1.0));
            umap_x.push(rng.gauss(profile.umap_center.0, 1.1));
            umap_y.push(rng.gauss(profile.umap_center.1, 1.1));

            // Roughly a quarter of the cells are cycling.
            let cycling = rng.next_f64() < 0.25;
            let s = if cycling { rng.gauss(0.6, 0.2) } else { rng.gauss(-0.05, 0.1) };
            let g2m = if cycling { rng.gauss(0.5, 0.25) } else { rng.gauss(-0.05, 0.1) };
            s_score.push(s);
            g2m_score.push(g2m);

            for (k, _) in S_MARKERS.iter().enumerate() {
                expression[k].push((rng.gauss(s.max(0.0) * 2.0, 0.4)).max(0.0));
            }
            for (k, _) in G2M_MARKERS.iter().enumerate() {
                expression[3 + k].push((rng.gauss(g2m.max(0.0) * 2.0, 0.4)).max(0.0));
            }
        }
    }

    let mut fields = vec![
        Field::new("batch", DataType::Utf8, false),
        Field::new("n_genes_by_counts", DataType::Int64, false),
        Field::new("total_counts", DataType::Float64, false),
        Field::new("pct_counts_mt", DataType::Float64, false),
        Field::new("X_umap-0", DataType::Float64, false),
        Field::new("X_umap-1", DataType::Float64, false),
        Field::new("S_score", DataType::Float64, false),
        Field::new("G2M_score", DataType::Float64, false),
    ];
    for name in S_MARKERS.iter().chain(G2M_MARKERS.iter()) {
        fields.push(Field::new(*name, DataType::Float64, false));
    }
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(StringArray::from(
            batch.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(genes)),
        Arc::new(Float64Array::from(counts)),
        Arc::new(Float64Array::from(mito)),
        Arc::new(Float64Array::from(umap_x)),
        Arc::new(Float64Array::from(umap_y)),
        Arc::new(Float64Array::from(s_score)),
        Arc::new(Float64Array::from(g2m_score)),
    ];
    for values in expression {
        columns.push(Arc::new(Float64Array::from(values)));
    }

    let batch_rec =
        RecordBatch::try_new(schema.clone(), columns).expect("Failed to create RecordBatch");

    std::fs::create_dir_all("data").expect("Failed to create data directory");

    let parquet_path = "data/sample_data.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch_rec).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    let config = serde_json::json!({
        "path_metrics": parquet_path,
        "conditions": BATCHES.iter().map(|b| b.name).collect::<Vec<_>>(),
        "col_features": "n_genes_by_counts",
        "col_counts": "total_counts",
        "col_mt": "pct_counts_mt",
    });
    let config_path = "data/config.json";
    std::fs::write(
        config_path,
        serde_json::to_string_pretty(&config).expect("Failed to serialize config"),
    )
    .expect("Failed to write config");

    println!("Wrote {n} cells to {parquet_path} and config to {config_path}");
}
