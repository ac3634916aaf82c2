mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::CellscopeApp;
use eframe::egui;
use state::AppState;

const DEFAULT_CONFIG: &str = "data/config.json";

fn main() -> eframe::Result {
    env_logger::init();

    // Config path from argv, falling back to the conventional location.
    // A missing or malformed config (or dataset) is fatal: the dashboard
    // never serves without its data.
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let state = match AppState::from_config_file(&config_path) {
        Ok(state) => state,
        Err(e) => {
            log::error!("startup failed: {e:#}");
            eprintln!("cellscope: {e:#}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Cellscope – scRNA-seq QC",
        options,
        Box::new(move |_cc| Ok(Box::new(CellscopeApp::new(state)))),
    )
}
