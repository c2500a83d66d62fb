//! Data model shared by the pipeline stages.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Length of the abbreviated commit hash used in directory names and logs.
pub const SHORT_HASH_LEN: usize = 8;

/// A working copy on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    /// Directory name, used for reporting and the skip list.
    pub name: String,
    /// Root of the working copy.
    pub root: PathBuf,
}

impl RepoHandle {
    /// Build a handle whose name is the last component of `root`.
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { name, root }
    }

    /// Root of the working copy.
    pub fn path(&self) -> &Path {
        &self.root
    }
}

/// A commit located in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    /// Full commit hash.
    pub hash: String,
    /// Commit instant with the offset git reported.
    pub timestamp: DateTime<FixedOffset>,
    /// Subject line, when the query asked for it.
    pub message: Option<String>,
}

impl CommitRef {
    /// Abbreviated hash.
    pub fn short(&self) -> &str {
        short_hash(&self.hash)
    }

    /// Calendar date of the commit in its own offset (`YYYY-MM-DD`).
    pub fn date(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }
}

/// Abbreviates a hash to [`SHORT_HASH_LEN`] characters.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}

/// How a snapshot's files were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMethod {
    /// Archive piped straight into the unpacker.
    StreamUnpack,
    /// Archive persisted to a file, then unpacked.
    FileUnpack,
    /// Individual files fetched one by one from history.
    PerFile,
}

impl fmt::Display for ExtractMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamUnpack => write!(f, "stream-unpack"),
            Self::FileUnpack => write!(f, "file-unpack"),
            Self::PerFile => write!(f, "per-file"),
        }
    }
}

/// A materialized file tree for one commit.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Directory holding the tree.
    pub root: PathBuf,
    /// Repository the tree came from.
    pub repo_name: String,
    /// Abbreviated hash of the commit.
    pub short_hash: String,
    /// Strategy that produced the final contents.
    pub method: ExtractMethod,
    /// Number of regular files in the tree.
    pub file_count: usize,
}

impl Snapshot {
    /// Returns true if no files were materialized.
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }
}

/// Which output parser produced a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// Sum of per-file detail lines.
    PerFile,
    /// Labeled totals from the summary section.
    Summary,
}

/// Conditions that do not fail a repository but must be visible in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// The snapshot holds source-like files but the counter reported zero lines.
    AnomalousZeroCount {
        /// Number of files with a recognized source extension
        source_files: usize,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnomalousZeroCount { source_files } => write!(
                f,
                "found {} source files but counted 0 lines",
                source_files
            ),
        }
    }
}

/// Size of a snapshot as measured by the counting tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeMeasurement {
    /// Total physical source lines.
    pub total_lines: u64,
    /// Cost figure: computed locally for per-file sums, tool-reported for summaries.
    pub cost: f64,
    /// Parser that produced the numbers, None when neither matched.
    pub strategy: Option<ParseStrategy>,
    /// Set when the count is zero despite source-like files being present.
    pub anomaly: Option<Anomaly>,
}

impl SizeMeasurement {
    /// A measurement of nothing.
    pub fn zero() -> Self {
        Self {
            total_lines: 0,
            cost: 0.0,
            strategy: None,
            anomaly: None,
        }
    }
}

/// One row of the output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Repository name.
    pub repo: String,
    /// First commit date, `YYYY-MM-DD`.
    pub date: String,
    /// First commit hash.
    pub first_commit: String,
    /// Last commit inside the window.
    pub analysis_commit: String,
    /// Physical source lines at the analysis commit.
    pub total_lines: u64,
    /// Cost estimate in currency units.
    pub cost_estimate: f64,
}

/// Pipeline position of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing done yet.
    Start,
    /// First commit located.
    FirstCommitFound,
    /// Last commit of the window located.
    WindowCommitFound,
    /// File list at the window commit checked.
    TreeVerified,
    /// Tree materialized.
    Extracted,
    /// Lines counted.
    Counted,
    /// Result appended.
    Recorded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::FirstCommitFound => "first-commit-found",
            Self::WindowCommitFound => "window-commit-found",
            Self::TreeVerified => "tree-verified",
            Self::Extracted => "extracted",
            Self::Counted => "counted",
            Self::Recorded => "recorded",
        };
        f.write_str(name)
    }
}
