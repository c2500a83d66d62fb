//! Finding repositories below a base directory.

use crate::error::Result;
use crate::types::RepoHandle;
use std::fs;
use std::path::{Path, PathBuf};

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Direct children of `base` that contain a `.git` entry, sorted by name.
///
/// # Errors
///
/// Returns an I/O error if `base` cannot be read.
pub fn discover_repositories(base: &Path) -> Result<Vec<RepoHandle>> {
    let base = expand_home(base);
    let mut repos = Vec::new();
    for entry in fs::read_dir(&base)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() && path.join(".git").exists() {
            repos.push(RepoHandle::from_path(path));
        }
    }
    repos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(repos)
}
