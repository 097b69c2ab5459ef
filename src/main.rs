// Application entry point for the GAFoam OpenFOAM front-end

// Settings file handling
mod config;
// Crate error type
mod error;
// OpenFOAM installations, command templates, process control, case folders
mod foam;
// Import the GUI module containing the main application state
mod gui;
// tracing subscriber setup
mod logging;
// Shared data models
mod models;

use config::ConfigManager;

/// Entry point for the application.
/// Loads settings, starts logging and launches the GUI window.
fn main() -> eframe::Result<()> {
    let config_path = config::default_config_path();
    let mut config = ConfigManager::new(&config_path);
    let config_error = config.load_or_create().err();

    logging::init_tracing(&config.settings().logging.level);
    tracing::info!("GAFoam starting");
    tracing::info!("Config: {}", config_path.display());
    if let Some(e) = config_error {
        tracing::warn!("Failed to load config: {}. Using defaults; changes will not be saved.", e);
    }

    // Configure window options with a 1000x600 starting size
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 600.0])
            .with_min_inner_size([800.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "GAFoam",
        options,
        Box::new(|cc| Ok(Box::new(gui::AppState::new(cc, config)))),
    )
}
