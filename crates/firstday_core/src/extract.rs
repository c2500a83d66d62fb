//! Materializing the tree of one commit into an isolated directory.
//!
//! Extraction degrades through a fixed chain:
//!
//! 1. archive the tree and pipe it into the unpacker
//! 2. persist the archive inside the target and unpack from that file
//! 3. if the target is still empty, fetch files one by one from history
//!
//! Steps 1 and 2 are an ordered list of unpack strategies where the first
//! success wins; if both fail the extraction fails. Step 3 only runs on an
//! empty result and tolerates individual missing files.

use crate::error::{FirstDayError, Result};
use crate::git::History;
use crate::process::CommandRunner;
use crate::types::{short_hash, ExtractMethod, RepoHandle, Snapshot};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Default cap on files written by per-file reconstruction.
/// Overridable through `[extract] reconstruct_limit`.
pub const RECONSTRUCT_LIMIT: usize = 20;

/// Prefix of the per-run temporary directory.
pub const WORKSPACE_PREFIX: &str = "sloccount_analysis_";

/// Unpacks archives produced by [`History::archive`].
pub trait Unpacker {
    /// Unpack archive bytes streamed on standard input into `target`.
    fn unpack_stream(&self, archive: &[u8], target: &Path) -> Result<()>;

    /// Unpack an archive file into `target`.
    fn unpack_file(&self, archive: &Path, target: &Path) -> Result<()>;
}

/// [`Unpacker`] backed by the `tar` command line.
#[derive(Debug, Clone)]
pub struct TarCli {
    runner: CommandRunner,
}

impl TarCli {
    /// Create a tar client running through `runner`.
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Check if tar is available.
    pub fn is_available(&self) -> bool {
        self.runner
            .command("tar")
            .arg("--version")
            .output()
            .map(|o| o.success())
            .unwrap_or(false)
    }
}

impl Unpacker for TarCli {
    fn unpack_stream(&self, archive: &[u8], target: &Path) -> Result<()> {
        self.runner
            .command("tar")
            .args(["-xf", "-", "-C"])
            .arg(target)
            .stdin_bytes(archive.to_vec())
            .checked()?;
        Ok(())
    }

    fn unpack_file(&self, archive: &Path, target: &Path) -> Result<()> {
        self.runner
            .command("tar")
            .arg("-xf")
            .arg(archive)
            .arg("-C")
            .arg(target)
            .checked()?;
        Ok(())
    }
}

/// Per-run temporary workspace. Everything below it is removed on drop.
pub struct Workspace {
    dir: TempDir,
    extract_root: PathBuf,
}

impl Workspace {
    /// Create the workspace under the system temporary directory.
    pub fn create() -> Result<Self> {
        Self::from_tempdir(tempfile::Builder::new().prefix(WORKSPACE_PREFIX).tempdir()?)
    }

    /// Create the workspace under `parent`.
    pub fn create_in(parent: &Path) -> Result<Self> {
        Self::from_tempdir(
            tempfile::Builder::new()
                .prefix(WORKSPACE_PREFIX)
                .tempdir_in(parent)?,
        )
    }

    fn from_tempdir(dir: TempDir) -> Result<Self> {
        let extract_root = dir.path().join("extracted_repos");
        fs::create_dir(&extract_root)?;
        Ok(Self { dir, extract_root })
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory holding every extraction of this run.
    pub fn extract_root(&self) -> &Path {
        &self.extract_root
    }

    /// Create a fresh directory `<repo>_<short hash>`, suffixed when already taken.
    pub fn target_for(&self, repo_name: &str, commit: &str) -> Result<PathBuf> {
        let base = format!("{}_{}", repo_name, short_hash(commit));
        for attempt in 1u32.. {
            let name = if attempt == 1 {
                base.clone()
            } else {
                format!("{}-{}", base, attempt)
            };
            let path = self.extract_root.join(name);
            match fs::create_dir(&path) {
                Ok(()) => return Ok(path),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        unreachable!("u32 range exhausted while naming extraction directory")
    }
}

type UnpackStep = fn(&dyn Unpacker, &RepoHandle, &[u8], &Path) -> Result<()>;

/// Unpack strategies, tried in order until one succeeds.
const UNPACK_CHAIN: [(ExtractMethod, UnpackStep); 2] = [
    (ExtractMethod::StreamUnpack, unpack_streamed),
    (ExtractMethod::FileUnpack, unpack_persisted),
];

fn unpack_streamed(
    unpacker: &dyn Unpacker,
    _repo: &RepoHandle,
    archive: &[u8],
    target: &Path,
) -> Result<()> {
    unpacker.unpack_stream(archive, target)
}

fn unpack_persisted(
    unpacker: &dyn Unpacker,
    repo: &RepoHandle,
    archive: &[u8],
    target: &Path,
) -> Result<()> {
    let archive_path = target.join(format!("{}.tar", repo.name));
    fs::write(&archive_path, archive)?;
    let result = unpacker.unpack_file(&archive_path, target);
    if let Err(e) = fs::remove_file(&archive_path) {
        warn!(path = %archive_path.display(), error = %e, "failed to remove intermediate archive");
    }
    result
}

/// Materializes commits using a history and an unpacker.
pub struct Extractor<'a> {
    history: &'a dyn History,
    unpacker: &'a dyn Unpacker,
    archive_format: String,
    reconstruct_limit: usize,
}

impl<'a> Extractor<'a> {
    /// Create an extractor with the default archive format and reconstruction cap.
    pub fn new(history: &'a dyn History, unpacker: &'a dyn Unpacker) -> Self {
        Self {
            history,
            unpacker,
            archive_format: "tar".to_string(),
            reconstruct_limit: RECONSTRUCT_LIMIT,
        }
    }

    /// Override the per-file reconstruction cap.
    pub fn with_reconstruct_limit(mut self, limit: usize) -> Self {
        self.reconstruct_limit = limit;
        self
    }

    /// Override the `git archive` format.
    pub fn with_archive_format(mut self, format: impl Into<String>) -> Self {
        self.archive_format = format.into();
        self
    }

    /// Extract `commit` into a new directory of `workspace`.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionFailed` if the archive cannot be produced or no
    /// unpack strategy succeeds. An empty result is not an error.
    pub fn extract(&self, repo: &RepoHandle, commit: &str, workspace: &Workspace) -> Result<Snapshot> {
        let target = workspace.target_for(&repo.name, commit)?;
        self.extract_into(repo, commit, &target)
    }

    /// Extract `commit` into an existing, empty `target` directory.
    pub fn extract_into(&self, repo: &RepoHandle, commit: &str, target: &Path) -> Result<Snapshot> {
        let failed = |reason: String| FirstDayError::ExtractionFailed {
            repo: repo.name.clone(),
            commit: commit.to_string(),
            reason,
        };

        match self.history.is_commit(repo.path(), commit) {
            Ok(true) => {}
            Ok(false) => warn!(repo = %repo.name, commit, "commit verification failed"),
            Err(e) => warn!(repo = %repo.name, commit, error = %e, "commit verification failed"),
        }

        let archive = self
            .history
            .archive(repo.path(), commit, &self.archive_format)
            .map_err(|e| failed(format!("archive: {}", e)))?;
        debug!(repo = %repo.name, commit = short_hash(commit), bytes = archive.len(), "archive produced");
        if archive.is_empty() {
            warn!(repo = %repo.name, commit = short_hash(commit), "archive is empty");
        }

        let mut method = None;
        let mut last_error = None;
        for (candidate, step) in UNPACK_CHAIN {
            match step(self.unpacker, repo, &archive, target) {
                Ok(()) => {
                    method = Some(candidate);
                    break;
                }
                Err(e) => {
                    warn!(repo = %repo.name, strategy = %candidate, error = %e, "unpack failed");
                    last_error = Some(e);
                }
            }
        }
        let mut method = method.ok_or_else(|| {
            failed(last_error.map_or_else(|| "no unpack strategy".to_string(), |e| e.to_string()))
        })?;

        if dir_is_empty(target)? {
            info!(repo = %repo.name, commit = short_hash(commit), "nothing unpacked, reconstructing file by file");
            self.reconstruct(repo, commit, target)?;
            method = ExtractMethod::PerFile;
        }

        let file_count = count_files(target);
        debug!(repo = %repo.name, method = %method, files = file_count, target = %target.display(), "extracted");

        Ok(Snapshot {
            root: target.to_path_buf(),
            repo_name: repo.name.clone(),
            short_hash: short_hash(commit).to_string(),
            method,
            file_count,
        })
    }

    /// Write the first `reconstruct_limit` files of `commit` into `target`.
    ///
    /// Returns the number of files written. Files that cannot be fetched are skipped.
    pub fn reconstruct(&self, repo: &RepoHandle, commit: &str, target: &Path) -> Result<usize> {
        let paths = match self.history.list_files(repo.path(), commit) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(repo = %repo.name, error = %e, "cannot list files for reconstruction");
                return Ok(0);
            }
        };
        if paths.len() > self.reconstruct_limit {
            warn!(
                repo = %repo.name,
                total = paths.len(),
                limit = self.reconstruct_limit,
                "reconstruction capped, remaining files are not materialized"
            );
        }

        let mut written = 0;
        for path in paths
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .take(self.reconstruct_limit)
        {
            if !is_contained(path) {
                warn!(repo = %repo.name, path, "refusing path outside snapshot");
                continue;
            }
            let content = match self.history.show_file(repo.path(), commit, path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(repo = %repo.name, path, error = %e, "failed to fetch file");
                    continue;
                }
            };
            let full = target.join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full, content)?;
            debug!(repo = %repo.name, path, "reconstructed");
            written += 1;
        }
        Ok(written)
    }
}

fn is_contained(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn dir_is_empty(dir: &Path) -> Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Number of regular files below `dir`.
pub fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}
