use super::assertions::Assertion;
use super::runner::ScenarioRunner;
use anyhow::{Context, Result};

/// One commit of a fixture repository.
#[derive(Debug, Clone)]
pub struct CommitSpec {
    pub date: String,
    pub files: Vec<(String, String)>,
    pub removed: Vec<String>,
}

/// A fixture repository: a name and its commits in order.
#[derive(Debug, Clone)]
pub struct RepoSpec {
    pub name: String,
    pub commits: Vec<CommitSpec>,
}

impl RepoSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            commits: Vec::new(),
        }
    }

    /// Commit `files` (path, content) at `date`
    pub fn commit(self, date: &str, files: &[(&str, &str)]) -> Self {
        self.commit_removing(date, files, &[])
    }

    /// Commit `files` and delete `removed` at `date`
    pub fn commit_removing(mut self, date: &str, files: &[(&str, &str)], removed: &[&str]) -> Self {
        self.commits.push(CommitSpec {
            date: date.to_string(),
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            removed: removed.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    /// Commit without changing the tree
    pub fn empty_commit(self, date: &str) -> Self {
        self.commit(date, &[])
    }
}

/// Fluent DSL for building test scenarios
pub struct Scenario {
    pub(crate) name: String,
    pub(crate) repos: Vec<RepoSpec>,
    pub(crate) skiplist: Vec<String>,
    pub(crate) counter_missing: bool,
    pub(crate) window_hours: Option<i64>,
    pub(crate) reconstruct_limit: Option<usize>,
    pub(crate) existing_table: Option<String>,
    assertions: Vec<Assertion>,
}

impl Scenario {
    /// Create a new scenario with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            repos: Vec::new(),
            skiplist: Vec::new(),
            counter_missing: false,
            window_hours: None,
            reconstruct_limit: None,
            existing_table: None,
            assertions: Vec::new(),
        }
    }

    // ===== Setup =====

    /// Add a repository, analyzed in the order added
    pub fn with_repo(mut self, repo: RepoSpec) -> Self {
        self.repos.push(repo);
        self
    }

    /// Put `name` on the skip list
    pub fn skipping(mut self, name: &str) -> Self {
        self.skiplist.push(name.to_string());
        self
    }

    /// Pretend the counting tool is not installed
    pub fn without_counter(mut self) -> Self {
        self.counter_missing = true;
        self
    }

    /// Override the window length
    pub fn window_hours(mut self, hours: i64) -> Self {
        self.window_hours = Some(hours);
        self
    }

    /// Override the per-file reconstruction cap
    pub fn reconstruct_limit(mut self, limit: usize) -> Self {
        self.reconstruct_limit = Some(limit);
        self
    }

    /// Leave a table from an earlier run where the output will be written
    pub fn with_existing_table(mut self, contents: &str) -> Self {
        self.existing_table = Some(contents.to_string());
        self
    }

    // ===== Assertions =====

    pub fn assert_row_count(mut self, count: usize) -> Self {
        self.assertions.push(Assertion::RowCount(count));
        self
    }

    pub fn assert_lines(mut self, repo: &str, lines: u64) -> Self {
        self.assertions.push(Assertion::Lines {
            repo: repo.to_string(),
            lines,
        });
        self
    }

    pub fn assert_cost(mut self, repo: &str, cost: f64) -> Self {
        self.assertions.push(Assertion::Cost {
            repo: repo.to_string(),
            cost,
        });
        self
    }

    pub fn assert_date(mut self, repo: &str, date: &str) -> Self {
        self.assertions.push(Assertion::Date {
            repo: repo.to_string(),
            date: date.to_string(),
        });
        self
    }

    /// The first commit is the `index`-th commit made (0-based)
    pub fn assert_first_commit(mut self, repo: &str, index: usize) -> Self {
        self.assertions.push(Assertion::FirstCommit {
            repo: repo.to_string(),
            index,
        });
        self
    }

    /// The analysis commit is the `index`-th commit made (0-based)
    pub fn assert_analysis_commit(mut self, repo: &str, index: usize) -> Self {
        self.assertions.push(Assertion::AnalysisCommit {
            repo: repo.to_string(),
            index,
        });
        self
    }

    pub fn assert_skipped(mut self, repo: &str) -> Self {
        self.assertions.push(Assertion::Skipped(repo.to_string()));
        self
    }

    pub fn assert_excluded(mut self, repo: &str) -> Self {
        self.assertions.push(Assertion::Excluded(repo.to_string()));
        self
    }

    pub fn assert_anomaly(mut self, repo: &str) -> Self {
        self.assertions.push(Assertion::Anomaly(repo.to_string()));
        self
    }

    pub fn assert_fatal(mut self) -> Self {
        self.assertions.push(Assertion::Fatal);
        self
    }

    pub fn assert_no_fatal(mut self) -> Self {
        self.assertions.push(Assertion::NoFatal);
        self
    }

    /// Rows appear in exactly this repository order
    pub fn assert_order(mut self, repos: &[&str]) -> Self {
        self.assertions
            .push(Assertion::Order(repos.iter().map(|r| r.to_string()).collect()));
        self
    }

    /// The written table reads back with this many rows
    pub fn assert_table_rows(mut self, count: usize) -> Self {
        self.assertions.push(Assertion::TableRows(count));
        self
    }

    /// The table on disk still holds exactly `contents`
    pub fn assert_table_unchanged(mut self, contents: &str) -> Self {
        self.assertions.push(Assertion::TableContents(contents.to_string()));
        self
    }

    /// Number of snapshots handed to the counter
    pub fn assert_counter_runs(mut self, count: usize) -> Self {
        self.assertions.push(Assertion::CounterRuns(count));
        self
    }

    // ===== Execution =====

    /// Build the repositories, run the analysis and check every assertion.
    ///
    /// Returns Ok without doing anything when git or tar is not installed.
    pub fn run(self) -> Result<()> {
        let Some(outcome) = ScenarioRunner::new(&self)?.execute()? else {
            eprintln!("skipping scenario '{}': git or tar not installed", self.name);
            return Ok(());
        };
        for (i, assertion) in self.assertions.iter().enumerate() {
            assertion
                .check(&outcome)
                .with_context(|| format!("scenario '{}', assertion {}: {:?}", self.name, i, assertion))?;
        }
        Ok(())
    }
}
