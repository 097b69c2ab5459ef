// OpenFOAM integration: installations, command templates, process control and case folders

pub mod case;
pub mod commands;
pub mod install;
pub mod runner;

pub use commands::{FoamTask, paraview_command};
pub use install::Installation;
pub use runner::{ProcessHandle, ProcessRunner};
