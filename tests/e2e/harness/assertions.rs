use super::runner::Outcome;
use anyhow::{anyhow, ensure, Result};
use firstday_core::{read_results, AnalysisResult};

/// Declarative assertions on a run
#[derive(Debug)]
pub enum Assertion {
    // Rows
    RowCount(usize),
    Lines { repo: String, lines: u64 },
    Cost { repo: String, cost: f64 },
    Date { repo: String, date: String },
    FirstCommit { repo: String, index: usize },
    AnalysisCommit { repo: String, index: usize },
    Order(Vec<String>),

    // Outcomes other than a row
    Skipped(String),
    Excluded(String),
    Anomaly(String),
    Fatal,
    NoFatal,

    // Side effects
    TableRows(usize),
    TableContents(String),
    CounterRuns(usize),
}

impl Assertion {
    pub fn check(&self, outcome: &Outcome) -> Result<()> {
        let report = &outcome.report;
        match self {
            Assertion::RowCount(n) => {
                ensure!(report.results.len() == *n, "expected {} rows, got {}", n, report.results.len());
            }
            Assertion::Lines { repo, lines } => {
                let row = row(outcome, repo)?;
                ensure!(row.total_lines == *lines, "{}: expected {} lines, got {}", repo, lines, row.total_lines);
            }
            Assertion::Cost { repo, cost } => {
                let row = row(outcome, repo)?;
                ensure!(
                    (row.cost_estimate - cost).abs() < 0.005,
                    "{}: expected cost {:.2}, got {:.2}",
                    repo,
                    cost,
                    row.cost_estimate
                );
            }
            Assertion::Date { repo, date } => {
                let row = row(outcome, repo)?;
                ensure!(&row.date == date, "{}: expected date {}, got {}", repo, date, row.date);
            }
            Assertion::FirstCommit { repo, index } => {
                let row = row(outcome, repo)?;
                let expected = hash(outcome, repo, *index)?;
                ensure!(row.first_commit == expected, "{}: first commit is not #{}", repo, index);
            }
            Assertion::AnalysisCommit { repo, index } => {
                let row = row(outcome, repo)?;
                let expected = hash(outcome, repo, *index)?;
                let actual = outcome.hashes[repo]
                    .iter()
                    .position(|h| *h == row.analysis_commit);
                ensure!(
                    row.analysis_commit == expected,
                    "{}: expected analysis commit #{}, got #{:?}",
                    repo,
                    index,
                    actual
                );
            }
            Assertion::Order(expected) => {
                let actual: Vec<&str> = report.results.iter().map(|r| r.repo.as_str()).collect();
                ensure!(actual == *expected, "expected order {:?}, got {:?}", expected, actual);
            }
            Assertion::Skipped(repo) => {
                ensure!(
                    report.skipped.iter().any(|s| &s.repo == repo),
                    "{} was not skipped (skipped: {:?})",
                    repo,
                    report.skipped
                );
                ensure!(!report.results.iter().any(|r| &r.repo == repo), "{} has a row", repo);
            }
            Assertion::Excluded(repo) => {
                ensure!(report.excluded.contains(repo), "{} was not excluded", repo);
                ensure!(!report.results.iter().any(|r| &r.repo == repo), "{} has a row", repo);
            }
            Assertion::Anomaly(repo) => {
                ensure!(
                    report.anomalies.iter().any(|a| &a.repo == repo),
                    "no anomaly recorded for {}",
                    repo
                );
            }
            Assertion::Fatal => ensure!(report.fatal.is_some(), "run did not abort"),
            Assertion::NoFatal => {
                ensure!(report.fatal.is_none(), "run aborted: {:?}", report.fatal);
            }
            Assertion::TableRows(n) => {
                let rows = read_results(&outcome.table)?;
                ensure!(rows.len() == *n, "table has {} rows, expected {}", rows.len(), n);
                ensure!(rows == report.results, "table rows differ from report");
            }
            Assertion::TableContents(expected) => {
                let actual = std::fs::read_to_string(&outcome.table)?;
                ensure!(actual == *expected, "table was rewritten:\n{}", actual);
            }
            Assertion::CounterRuns(n) => {
                ensure!(outcome.counted.len() == *n, "counter ran {} times, expected {}", outcome.counted.len(), n);
            }
        }
        Ok(())
    }
}

fn row<'a>(outcome: &'a Outcome, repo: &str) -> Result<&'a AnalysisResult> {
    outcome
        .report
        .results
        .iter()
        .find(|r| r.repo == repo)
        .ok_or_else(|| anyhow!("no row for {}", repo))
}

fn hash(outcome: &Outcome, repo: &str, index: usize) -> Result<String> {
    outcome
        .hashes
        .get(repo)
        .and_then(|h| h.get(index))
        .cloned()
        .ok_or_else(|| anyhow!("{} has no commit #{}", repo, index))
}
