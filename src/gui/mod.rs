// GUI module organization and public exports

// Main application state, handlers and UI layout
mod app;
// Reusable UI components (tree view, status labels, buttons)
mod components;
// CPU and root filesystem usage for the status bar
mod system_monitor;

// Export AppState for use in main.rs
pub use app::AppState;
// Export all component functions
pub use components::*;
