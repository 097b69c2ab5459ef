// Data models shared between the case tools and the GUI

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Kind of entry in the case directory tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// One entry of the case directory tree.
/// Directories hold their children already sorted for display.
#[derive(Clone, Debug)]
pub struct TreeNode {
    /// File or directory name as shown in the tree
    pub name: String,
    /// Absolute path of the entry
    pub path: PathBuf,
    /// Whether the entry is a directory or a file
    pub kind: NodeKind,
    /// Child entries (always empty for files)
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            children: vec![],
        }
    }

    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children: vec![],
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Which pipe a line of process output came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Identifier handed out for every spawned process.
pub type ProcessId = u64;

/// Notification sent from process reader threads to the UI thread.
#[derive(Clone, Debug, PartialEq)]
pub enum ProcessEvent {
    /// A line of text written by the process
    Output {
        id: ProcessId,
        stream: OutputStream,
        line: String,
    },
    /// The process exited; `code` is None when it was killed by a signal
    Finished { id: ProcessId, code: Option<i32> },
}

/// Transient message in the status bar.
/// Messages without an expiry stay until replaced.
#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub text: String,
    expires_at: Option<Instant>,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            text: text.into(),
            expires_at: timeout.map(|t| Instant::now() + t),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Space usage of the filesystem mounted at `/`, in GiB.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StorageUsage {
    /// Total capacity in gibibytes
    pub total_gb: f64,
    /// Occupied space in gibibytes
    pub used_gb: f64,
    /// Percentage of the capacity in use (0-100)
    pub used_percent: f64,
}
