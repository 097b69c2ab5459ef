// Settings sections stored in `settings.toml`.
//
// Every field has a default so a partial or empty file still loads.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings structure; each field maps to one TOML table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// OpenFOAM installation and solver selection.
    #[serde(default)]
    pub foam: FoamSettings,

    /// Working case folder.
    #[serde(default)]
    pub case: CaseSettings,

    /// Post-processing viewer.
    #[serde(default)]
    pub paraview: ParaviewSettings,

    /// Window behaviour.
    #[serde(default)]
    pub ui: UiSettings,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoamSettings {
    /// Directory holding the OpenFOAM installations (e.g. /opt).
    #[serde(default = "default_install_root")]
    pub install_root: PathBuf,

    /// Installation directory name under `install_root`.
    #[serde(default = "default_version")]
    pub version: String,

    /// Solver executable used for parallel runs.
    #[serde(default = "default_solver")]
    pub solver: String,

    /// Number of MPI ranks passed to `mpirun -np`.
    #[serde(default = "default_processors")]
    pub processors: u32,

    /// Shell used to source the OpenFOAM environment.
    #[serde(default = "default_shell")]
    pub shell: String,
}

impl Default for FoamSettings {
    fn default() -> Self {
        Self {
            install_root: default_install_root(),
            version: default_version(),
            solver: default_solver(),
            processors: default_processors(),
            shell: default_shell(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseSettings {
    /// Fixed case directory. When unset, the folder of the imported mesh is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParaviewSettings {
    #[serde(default = "default_paraview_program")]
    pub program: String,

    /// Marker file inside the case handed to `--data=`.
    #[serde(default = "default_foam_file")]
    pub foam_file: String,
}

impl Default for ParaviewSettings {
    fn default() -> Self {
        Self {
            program: default_paraview_program(),
            foam_file: default_foam_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    /// Interval between CPU/disk samples in milliseconds.
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,

    /// Maximum number of lines kept in the terminal view.
    #[serde(default = "default_scrollback_lines")]
    pub scrollback_lines: usize,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            monitor_interval_ms: default_monitor_interval_ms(),
            scrollback_lines: default_scrollback_lines(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when RUST_LOG is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_install_root() -> PathBuf {
    PathBuf::from("/opt")
}

fn default_version() -> String {
    "openfoam9".to_string()
}

fn default_solver() -> String {
    "twoLiquidMixingFoam".to_string()
}

fn default_processors() -> u32 {
    6
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_paraview_program() -> String {
    "paraview".to_string()
}

fn default_foam_file() -> String {
    "foam.foam".to_string()
}

fn default_monitor_interval_ms() -> u64 {
    2000
}

fn default_scrollback_lines() -> usize {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}
