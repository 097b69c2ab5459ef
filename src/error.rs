// Error type shared by the case, process and configuration modules

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while working with a case folder or its external tools.
#[derive(Error, Debug)]
pub enum FoamError {
    /// Filesystem access failed for the given path
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The case directory does not exist
    #[error("Case directory not found: {0}")]
    CaseNotFound(PathBuf),

    /// An external program could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Delivering a signal to a running process failed
    #[error("failed to signal process {pid}: {source}")]
    Signal { pid: i32, source: nix::Error },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// The settings file could not be parsed at startup and is left untouched
    #[error("Settings file {0} failed to load; not overwriting it")]
    ConfigReadOnly(PathBuf),
}

impl FoamError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FoamError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FoamError>;
