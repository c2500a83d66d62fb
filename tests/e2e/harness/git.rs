use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Returns true if `git` can be run.
pub fn git_available() -> bool {
    program_runs("git")
}

/// Returns true if both `git` and `tar` can be run.
pub fn tools_available() -> bool {
    git_available() && program_runs("tar")
}

fn program_runs(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A git repository on disk whose commit dates are fully controlled.
pub struct FixtureRepo {
    root: PathBuf,
    hashes: Vec<String>,
}

impl FixtureRepo {
    /// `git init` a fresh repository at `root`
    pub fn init(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        let repo = Self {
            root: root.to_path_buf(),
            hashes: Vec::new(),
        };
        repo.git(&["init", "-q"], None)?;
        Ok(repo)
    }

    /// Repository directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Directory name
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Hashes of commits made so far, oldest first
    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }

    /// Write `files`, remove `removed`, and commit everything at `date` (ISO 8601)
    pub fn commit(&mut self, date: &str, files: &[(String, String)], removed: &[String]) -> Result<String> {
        for (path, content) in files {
            let full = self.root.join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full, content).with_context(|| format!("writing {}", path))?;
        }
        for path in removed {
            fs::remove_file(self.root.join(path)).with_context(|| format!("removing {}", path))?;
        }
        self.git(&["add", "-A"], None)?;
        let message = format!("commit {}", self.hashes.len() + 1);
        self.git(&["commit", "-q", "--allow-empty", "-m", &message], Some(date))?;
        let hash = self.git(&["rev-parse", "HEAD"], None)?.trim().to_string();
        self.hashes.push(hash.clone());
        Ok(hash)
    }

    /// Commit with no tree changes at `date`
    pub fn commit_empty(&mut self, date: &str) -> Result<String> {
        self.commit(date, &[], &[])
    }

    fn git(&self, args: &[&str], date: Option<&str>) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.args([
            "-c",
            "user.name=Fixture",
            "-c",
            "user.email=fixture@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(&self.root)
        .env("GIT_CONFIG_NOSYSTEM", "1");
        if let Some(date) = date {
            cmd.env("GIT_AUTHOR_DATE", date).env("GIT_COMMITTER_DATE", date);
        }
        let out = cmd.output().with_context(|| format!("running git {:?}", args))?;
        if !out.status.success() {
            bail!(
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}
