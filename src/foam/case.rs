// Operations on an OpenFOAM case folder

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FoamError, Result};
use crate::models::TreeNode;

static TIME_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid time dir pattern")
});

/// Builds the directory tree rooted at `dir`, with the root itself as the top node.
pub fn scan_tree(dir: &Path) -> Result<TreeNode> {
    if !dir.is_dir() {
        return Err(FoamError::CaseNotFound(dir.to_path_buf()));
    }
    scan_dir(dir)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    LinkedDir,
    File,
}

fn scan_dir(dir: &Path) -> Result<TreeNode> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    let mut node = TreeNode::directory(name, dir);

    let mut entries: Vec<(String, PathBuf, EntryKind)> = fs::read_dir(dir)
        .map_err(|e| FoamError::io(dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| {
            let path = e.path();
            let kind = match e.file_type() {
                Ok(t) if t.is_dir() => EntryKind::Dir,
                // shown as a directory but never descended into
                Ok(t) if t.is_symlink() && path.is_dir() => EntryKind::LinkedDir,
                _ => EntryKind::File,
            };
            (e.file_name().to_string_lossy().into_owned(), path, kind)
        })
        .collect();

    entries.sort_by(|a, b| match (a.2 == EntryKind::File, b.2 == EntryKind::File) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => a.0.to_lowercase().cmp(&b.0.to_lowercase()),
    });

    for (name, path, kind) in entries {
        match kind {
            EntryKind::Dir => match scan_dir(&path) {
                Ok(child) => node.children.push(child),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                    node.children.push(TreeNode::directory(name, path));
                }
            },
            EntryKind::LinkedDir => node.children.push(TreeNode::directory(name, path)),
            EntryKind::File => node.children.push(TreeNode::file(name, path)),
        }
    }

    Ok(node)
}

/// Whether `name` is a time directory written after the initial state.
pub fn is_result_time_dir(name: &str) -> bool {
    TIME_DIR_RE.is_match(name) && name.parse::<f64>().map(|t| t > 0.0).unwrap_or(false)
}

/// Removes the `processor*` directories left by `decomposePar`.
pub fn remove_processor_dirs(case_dir: &Path) -> Result<Vec<String>> {
    remove_subdirs(case_dir, |name| name.starts_with("processor"))
}

/// Removes time directories greater than zero; `0`, `constant` and `system` stay.
pub fn remove_time_dirs(case_dir: &Path) -> Result<Vec<String>> {
    remove_subdirs(case_dir, is_result_time_dir)
}

fn remove_subdirs(case_dir: &Path, matches: impl Fn(&str) -> bool) -> Result<Vec<String>> {
    if !case_dir.is_dir() {
        return Err(FoamError::CaseNotFound(case_dir.to_path_buf()));
    }

    let mut names: Vec<String> = fs::read_dir(case_dir)
        .map_err(|e| FoamError::io(case_dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| matches(name))
        .collect();
    names.sort();

    let mut removed = Vec::with_capacity(names.len());
    for name in names {
        let path = case_dir.join(&name);
        match fs::remove_dir_all(&path) {
            Ok(()) => {
                tracing::info!("Removed {}", path.display());
                removed.push(name);
            }
            Err(e) => tracing::warn!("could not remove {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

/// Reads a dictionary or other text file for the editor.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| FoamError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| FoamError::io(path, e))
}
