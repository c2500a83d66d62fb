//! Version-control queries used by the pipeline.
//!
//! [`History`] is the seam between the pipeline and git. [`GitCli`] shells out
//! to the `git` binary; tests substitute in-memory histories.

use crate::error::{FirstDayError, Result};
use crate::process::CommandRunner;
use chrono::{DateTime, FixedOffset};
use std::path::Path;

/// Log format: full hash, space, committer date with offset (`2023-01-15 14:30:45 +0000`).
pub const LOG_FORMAT: &str = "--format=%H %ci";

/// Read access to one repository's history.
pub trait History {
    /// Number of commits reachable from HEAD.
    fn commit_count(&self, repo: &Path) -> Result<u64>;

    /// Raw `<hash> <timestamp>` lines, oldest first, optionally bounded (both ends inclusive).
    fn log_oldest_first(
        &self,
        repo: &Path,
        since: Option<&DateTime<FixedOffset>>,
        until: Option<&DateTime<FixedOffset>>,
    ) -> Result<String>;

    /// Paths of all files recorded at `commit`.
    fn list_files(&self, repo: &Path, commit: &str) -> Result<Vec<String>>;

    /// Content of one file at `commit`.
    fn show_file(&self, repo: &Path, commit: &str, path: &str) -> Result<Vec<u8>>;

    /// Archive of the whole tree at `commit`.
    fn archive(&self, repo: &Path, commit: &str, format: &str) -> Result<Vec<u8>>;

    /// Returns true if `commit` names a commit object.
    fn is_commit(&self, repo: &Path, commit: &str) -> Result<bool>;
}

/// [`History`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    runner: CommandRunner,
    program: String,
}

impl GitCli {
    /// Create a git client running through `runner`.
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            runner,
            program: "git".to_string(),
        }
    }

    /// Check if git is available.
    pub fn is_available(&self) -> bool {
        self.runner
            .command(&self.program)
            .arg("--version")
            .output()
            .map(|o| o.success())
            .unwrap_or(false)
    }

    fn git(&self, repo: &Path, args: &[&str]) -> Result<Vec<u8>> {
        Ok(self
            .runner
            .command(&self.program)
            .args(args)
            .current_dir(repo)
            .checked()?
            .stdout)
    }
}

impl History for GitCli {
    fn commit_count(&self, repo: &Path) -> Result<u64> {
        let out = self.git(repo, &["rev-list", "--count", "HEAD"])?;
        let text = String::from_utf8_lossy(&out);
        text.trim().parse().map_err(|_| {
            FirstDayError::MalformedLogOutput(format!("commit count {:?}", text.trim()))
        })
    }

    fn log_oldest_first(
        &self,
        repo: &Path,
        since: Option<&DateTime<FixedOffset>>,
        until: Option<&DateTime<FixedOffset>>,
    ) -> Result<String> {
        // --max-count is applied before --reverse, so the oldest commit needs the full walk.
        let mut args = vec!["log".to_string(), "--reverse".to_string(), LOG_FORMAT.to_string()];
        if let Some(since) = since {
            args.push(format!("--since={}", since.to_rfc3339()));
        }
        if let Some(until) = until {
            args.push(format!("--until={}", until.to_rfc3339()));
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = self.git(repo, &args)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn list_files(&self, repo: &Path, commit: &str) -> Result<Vec<String>> {
        let out = self.git(repo, &["ls-tree", "-r", "--name-only", "-z", commit])?;
        Ok(out
            .split(|b| *b == 0)
            .filter(|p| !p.is_empty())
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect())
    }

    fn show_file(&self, repo: &Path, commit: &str, path: &str) -> Result<Vec<u8>> {
        self.git(repo, &["show", &format!("{}:{}", commit, path)])
    }

    fn archive(&self, repo: &Path, commit: &str, format: &str) -> Result<Vec<u8>> {
        self.git(repo, &["archive", &format!("--format={}", format), commit])
    }

    fn is_commit(&self, repo: &Path, commit: &str) -> Result<bool> {
        let out = self
            .runner
            .command(&self.program)
            .args(["cat-file", "-t", commit])
            .current_dir(repo)
            .output()?;
        Ok(out.success() && out.stdout_lossy().trim() == "commit")
    }
}
