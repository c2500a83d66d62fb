//! Error types for firstday_core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for first-day analysis.
#[derive(Error, Debug)]
pub enum FirstDayError {
    /// The repository has no commits reachable from HEAD.
    #[error("no commits found in {}", path.display())]
    EmptyRepository {
        /// Root of the repository
        path: PathBuf,
    },

    /// `git log` produced output that does not have the `<hash> <timestamp>` shape.
    #[error("malformed log output: {0}")]
    MalformedLogOutput(String),

    /// The window query returned nothing, although the window always contains its start.
    #[error("no commits found in the first {window_hours} hours after {start} (history is inconsistent)")]
    NoCommitsInWindow {
        /// Inclusive window start, as reported by git
        start: String,
        /// Window length in hours
        window_hours: i64,
    },

    /// Every unpacking strategy failed.
    #[error("failed to extract {repo} at {commit}: {reason}")]
    ExtractionFailed {
        /// Repository name
        repo: String,
        /// Commit hash being extracted
        commit: String,
        /// Description of the last failure
        reason: String,
    },

    /// The source-counting tool cannot be located. Fatal to the whole run.
    #[error("{program} not found. Install it with: apt install sloccount")]
    CountingToolUnavailable {
        /// Program that was looked up
        program: String,
    },

    /// The counting tool ran but reported failure.
    #[error("{program} failed on {}: {stderr}", dir.display())]
    CountingFailed {
        /// Program that failed
        program: String,
        /// Directory being counted
        dir: PathBuf,
        /// Captured standard error
        stderr: String,
    },

    /// An external command exited with a non-zero status.
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        /// Command line that was run
        command: String,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// An external command did not finish in time and was killed.
    #[error("`{command}` timed out after {timeout_secs}s")]
    CommandTimeout {
        /// Command line that was run
        command: String,
        /// Configured timeout in seconds
        timeout_secs: u64,
    },

    /// An external command could not be started.
    #[error("failed to start `{program}`: {source}")]
    SpawnFailed {
        /// Program name
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A persisted result table could not be parsed.
    #[error("invalid result table at {}: {}", path.display(), reason)]
    TableError {
        /// Path to the table
        path: PathBuf,
        /// Description of the problem
        reason: String,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FirstDayError {
    /// Returns true for errors that must abort the whole run rather than skip one repository.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::CountingToolUnavailable { .. })
    }

    /// Returns true if the error came from a program that does not exist on PATH.
    pub fn is_program_missing(&self) -> bool {
        match self {
            Self::SpawnFailed { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::CountingToolUnavailable { .. } => true,
            _ => false,
        }
    }

    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::CountingToolUnavailable { .. } => {
                Some("Install sloccount (apt install sloccount) or set [counter] program in firstday.toml.")
            }
            Self::EmptyRepository { .. } => {
                Some("Repository has no history yet. Add it to skiplist.txt to silence this.")
            }
            Self::NoCommitsInWindow { .. } => {
                Some("Commit timestamps are out of order. Check the repository for clock skew.")
            }
            Self::CommandTimeout { .. } => {
                Some("Raise [process] timeout_secs in firstday.toml, or set it to 0 to disable it.")
            }
            Self::TableError { .. } => {
                Some("Regenerate the table with 'firstday analyze'.")
            }
            _ => None,
        }
    }
}

/// Convenience Result type for firstday_core operations.
pub type Result<T> = std::result::Result<T, FirstDayError>;
