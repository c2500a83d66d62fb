//! Locating the first commit of a repository.

use crate::error::{FirstDayError, Result};
use crate::git::History;
use crate::types::{CommitRef, RepoHandle};
use chrono::DateTime;
use tracing::debug;

/// Timestamp layout of `%ci`: `2023-01-15 14:30:45 +0000`.
const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Parse one `<hash> <timestamp>` log record, keeping the timestamp's UTC offset.
///
/// # Errors
///
/// Returns `MalformedLogOutput` if the line lacks either field or the
/// timestamp does not parse.
pub fn parse_log_line(line: &str) -> Result<CommitRef> {
    let line = line.trim();
    let (hash, timestamp) = line
        .split_once(' ')
        .ok_or_else(|| FirstDayError::MalformedLogOutput(format!("expected `<hash> <date>`, got {:?}", line)))?;

    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FirstDayError::MalformedLogOutput(format!(
            "invalid commit hash {:?}",
            hash
        )));
    }

    let timestamp = DateTime::parse_from_str(timestamp.trim(), GIT_DATE_FORMAT).map_err(|e| {
        FirstDayError::MalformedLogOutput(format!("invalid timestamp {:?}: {}", timestamp, e))
    })?;

    Ok(CommitRef {
        hash: hash.to_string(),
        timestamp,
        message: None,
    })
}

/// Find the oldest commit reachable from HEAD.
///
/// # Errors
///
/// Returns:
/// - `EmptyRepository` if the commit count is zero or cannot be queried
/// - `MalformedLogOutput` if the oldest log record cannot be parsed
pub fn locate_first_commit(history: &dyn History, repo: &RepoHandle) -> Result<CommitRef> {
    let empty = || FirstDayError::EmptyRepository {
        path: repo.root.clone(),
    };

    match history.commit_count(repo.path()) {
        Ok(0) => return Err(empty()),
        Ok(count) => debug!(repo = %repo.name, count, "commits reachable from HEAD"),
        Err(e) => {
            debug!(repo = %repo.name, error = %e, "commit count query failed");
            return Err(empty());
        }
    }

    let log = history.log_oldest_first(repo.path(), None, None)?;
    let first = log
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(empty)?;

    let commit = parse_log_line(first)?;
    debug!(repo = %repo.name, commit = %commit.short(), at = %commit.timestamp, "first commit");
    Ok(commit)
}
