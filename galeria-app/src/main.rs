//! # Galeria
//!
//! Local photo and video gallery on top of galeria-core.

mod app;
mod clock_player;
mod platform;
mod viewer;

use anyhow::Result;
use eframe::egui;
use galeria_core::config::{config_file_path, AppConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "galeria=debug,galeria_core=debug,eframe=warn".into()),
        )
        .init();

    tracing::info!("Galeria v{}", galeria_core::VERSION);

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Config unreadable, using defaults: {}", e);
            AppConfig::default()
        }
    };
    let config_path = config_file_path();
    if !config_path.exists() {
        if let Err(e) = config.save_to(&config_path) {
            tracing::warn!("Could not write default config: {}", e);
        }
    }
    tracing::debug!("Media root: {:?}", config.store.root);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Galeria")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Galeria",
        options,
        Box::new(|cc| Ok(Box::new(app::GaleriaApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}
