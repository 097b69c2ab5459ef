// OpenFOAM installation layout under the install root (usually `/opt`)

use std::fs;
use std::path::{Path, PathBuf};

/// Version used when nothing is installed under the root.
pub const FALLBACK_VERSION: &str = "openfoam9";

/// Lists installation directories named `openfoam*` or `OpenFOAM*`.
pub fn detect_versions(root: &Path) -> Vec<String> {
    let mut versions: Vec<String> = match fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.starts_with("openfoam") || name.starts_with("OpenFOAM"))
            .collect(),
        Err(e) => {
            tracing::debug!("cannot list {}: {}", root.display(), e);
            Vec::new()
        }
    };

    if versions.is_empty() {
        tracing::warn!(
            "No OpenFOAM installation found in {}, falling back to {}",
            root.display(),
            FALLBACK_VERSION
        );
        versions.push(FALLBACK_VERSION.to_string());
    }

    versions.sort();
    versions
}

/// A selected OpenFOAM installation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Installation {
    pub root: PathBuf,
    pub version: String,
}

impl Installation {
    pub fn new(root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            version: version.into(),
        }
    }

    /// `<root>/<version>`, exported to tools as `FOAM_RUN`.
    pub fn prefix(&self) -> PathBuf {
        self.root.join(&self.version)
    }

    /// Environment script sourced before every tool.
    pub fn bashrc(&self) -> PathBuf {
        self.prefix().join("etc").join("bashrc")
    }

    pub fn solvers_dir(&self) -> PathBuf {
        self.prefix().join("applications").join("solvers")
    }
}

/// Solver name for a directory picked under the solvers tree.
pub fn solver_name(solver_dir: &Path) -> Option<String> {
    solver_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}
