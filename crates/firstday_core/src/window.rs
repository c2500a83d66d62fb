//! Selecting the last commit inside the window that opens at the first commit.

use crate::error::{FirstDayError, Result};
use crate::git::History;
use crate::locate::parse_log_line;
use crate::types::{CommitRef, RepoHandle};
use chrono::{DateTime, Duration, FixedOffset};
use tracing::{debug, warn};

/// Default window length.
pub fn default_window() -> Duration {
    Duration::hours(24)
}

/// Return the last commit with a timestamp in `[start, start + window]`.
///
/// Records are taken in the order history reports them (oldest first) and
/// the last one inside the bounds wins. Bounds are re-checked locally, so a
/// store whose own date filter is loose cannot widen the window.
///
/// # Errors
///
/// Returns:
/// - `NoCommitsInWindow` if nothing falls inside the window. Since the first
///   commit is always inside its own window this indicates inconsistent
///   history (for example clock skew) rather than a normal outcome.
/// - `MalformedLogOutput` if a log record cannot be parsed
/// - `ConfigError` if `start + window` is not a representable date
pub fn last_commit_within(
    history: &dyn History,
    repo: &RepoHandle,
    start: &DateTime<FixedOffset>,
    window: Duration,
) -> Result<CommitRef> {
    let end = start.checked_add_signed(window).ok_or_else(|| {
        FirstDayError::ConfigError(format!(
            "window of {} hours after {} is out of range",
            window.num_hours(),
            start.to_rfc3339()
        ))
    })?;
    let log = history.log_oldest_first(repo.path(), Some(start), Some(&end))?;

    let mut last: Option<CommitRef> = None;
    let mut seen = 0usize;
    for line in log.lines().filter(|l| !l.trim().is_empty()) {
        let commit = parse_log_line(line)?;
        seen += 1;
        if commit.timestamp < *start || commit.timestamp > end {
            debug!(repo = %repo.name, commit = %commit.short(), at = %commit.timestamp, "outside window, ignored");
            continue;
        }
        if let Some(prev) = &last {
            if commit.timestamp < prev.timestamp {
                warn!(
                    repo = %repo.name,
                    commit = %commit.short(),
                    previous = %prev.short(),
                    "commit is dated before its predecessor, history has clock skew"
                );
            }
        }
        last = Some(commit);
    }

    match last {
        Some(commit) => {
            debug!(repo = %repo.name, commit = %commit.short(), records = seen, "last commit in window");
            Ok(commit)
        }
        None => Err(FirstDayError::NoCommitsInWindow {
            start: start.to_rfc3339(),
            window_hours: window.num_hours(),
        }),
    }
}
