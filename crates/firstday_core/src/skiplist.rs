//! Repository names excluded from analysis.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Set of repository names to leave out of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipList {
    names: BTreeSet<String>,
}

impl SkipList {
    /// Build from names directly.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one name per line; blank lines and `#` comments are ignored.
    pub fn parse(content: &str) -> Self {
        Self::from_names(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        )
    }

    /// Load from `path`, falling back to `defaults` if the file is absent or unreadable.
    pub fn load(path: &Path, defaults: &[String]) -> Self {
        if !path.exists() {
            return Self::from_names(defaults.iter().cloned());
        }
        match fs::read_to_string(path) {
            Ok(content) => {
                let list = Self::parse(&content);
                info!(path = %path.display(), count = list.len(), "loaded skip list");
                list
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read skip list, using defaults");
                Self::from_names(defaults.iter().cloned())
            }
        }
    }

    /// Returns true if `name` is excluded.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Excluded names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
