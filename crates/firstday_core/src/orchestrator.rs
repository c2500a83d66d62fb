//! Per-repository pipeline and run aggregation.
//!
//! Each repository moves through [`Stage`]s in order. A failure at any stage
//! skips that repository and the run continues; only a missing counting tool
//! stops the run. All extraction happens below one [`Workspace`] that lives
//! exactly as long as [`Analyzer::run`].

use crate::config::Config;
use crate::cost::{round_cents, CostModel};
use crate::count::{LineCounter, SizeCounter};
use crate::error::{FirstDayError, Result};
use crate::extract::{Extractor, Unpacker, Workspace};
use crate::git::History;
use crate::locate::locate_first_commit;
use crate::skiplist::SkipList;
use crate::types::{AnalysisResult, Anomaly, RepoHandle, Stage};
use crate::window::last_commit_within;
use serde::{Serialize, Serializer};
use tracing::{debug, error, info, warn};

/// Progress callback for a run.
/// Called with (current, total, repository name) before each repository starts.
pub type ProgressCallback<'p> = dyn Fn(usize, usize, &str) + 'p;

/// External tools the pipeline drives.
#[derive(Clone, Copy)]
pub struct Toolset<'a> {
    /// History queries.
    pub history: &'a dyn History,
    /// Archive unpacking.
    pub unpacker: &'a dyn Unpacker,
    /// Line counting.
    pub counter: &'a dyn LineCounter,
}

/// Run-wide settings handed to the analyzer at construction.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    /// Loaded configuration.
    pub config: Config,
    /// Repositories to leave out.
    pub skiplist: SkipList,
}

impl AnalysisContext {
    /// Bundle a configuration and a skip list.
    pub fn new(config: Config, skiplist: SkipList) -> Self {
        Self { config, skiplist }
    }

    fn cost_model(&self) -> CostModel {
        CostModel {
            coefficient: self.config.cost.coefficient,
            exponent: self.config.cost.exponent,
            rate: self.config.cost.rate,
        }
    }
}

/// A repository that contributed no row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRepo {
    /// Repository name.
    pub repo: String,
    /// Last stage reached before the failure.
    pub stage: Stage,
    /// Failure description.
    pub reason: String,
}

/// An anomaly attributed to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoAnomaly {
    /// Repository name.
    pub repo: String,
    /// What was observed.
    pub anomaly: Anomaly,
}

/// Everything a run produced, in input order.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// Rows for the result table.
    pub results: Vec<AnalysisResult>,
    /// Repositories that failed a stage.
    pub skipped: Vec<SkippedRepo>,
    /// Non-fatal oddities worth auditing.
    pub anomalies: Vec<RepoAnomaly>,
    /// Repositories left out by the skip list.
    pub excluded: Vec<String>,
    /// Error that stopped the run, if any. Rows gathered before it are kept.
    #[serde(serialize_with = "serialize_error")]
    pub fatal: Option<FirstDayError>,
}

impl RunReport {
    /// Sum of `total_lines` over all rows.
    pub fn total_lines(&self) -> u64 {
        self.results.iter().map(|r| r.total_lines).sum()
    }

    /// Sum of `cost_estimate` over all rows.
    pub fn total_cost(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.results.iter().map(|r| r.cost_estimate).sum()
    }

    /// Returns true if the run stopped early.
    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    /// Returns true if the result table should be written.
    ///
    /// A run that aborted before recording any row has nothing to persist and
    /// must leave an existing table alone.
    pub fn has_table(&self) -> bool {
        self.fatal.is_none() || !self.results.is_empty()
    }

    /// One-line description of the run.
    pub fn summary(&self) -> String {
        format!(
            "{} analyzed, {} skipped, {} excluded, {} anomalies",
            self.results.len(),
            self.skipped.len(),
            self.excluded.len(),
            self.anomalies.len()
        )
    }
}

fn serialize_error<S: Serializer>(err: &Option<FirstDayError>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match err {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

/// Outcome of one repository that reached `Recorded`.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoOutcome {
    /// The row to append.
    pub result: AnalysisResult,
    /// Anomaly seen while counting.
    pub anomaly: Option<Anomaly>,
}

/// A stage failure together with the last stage reached.
#[derive(Debug)]
pub struct StageFailure {
    /// Last stage completed.
    pub stage: Stage,
    /// What went wrong.
    pub error: FirstDayError,
}

/// Drives the first-day pipeline over a list of repositories.
pub struct Analyzer<'a> {
    tools: Toolset<'a>,
    context: AnalysisContext,
}

impl<'a> Analyzer<'a> {
    /// Create an analyzer over `tools` with run-wide `context`.
    pub fn new(tools: Toolset<'a>, context: AnalysisContext) -> Self {
        Self { tools, context }
    }

    /// The run context.
    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    /// Analyze `repos` in order.
    pub fn run(&self, repos: &[RepoHandle]) -> RunReport {
        self.run_with_progress(repos, &|_, _, _| {})
    }

    /// Analyze `repos` in order, reporting progress.
    pub fn run_with_progress(&self, repos: &[RepoHandle], progress: &ProgressCallback<'_>) -> RunReport {
        let mut report = RunReport::default();

        let (excluded, selected): (Vec<&RepoHandle>, Vec<&RepoHandle>) = repos
            .iter()
            .partition(|r| self.context.skiplist.contains(&r.name));
        for repo in &excluded {
            info!(repo = %repo.name, "excluded by skip list");
        }
        report.excluded = excluded.into_iter().map(|r| r.name.clone()).collect();

        match self.tools.counter.probe() {
            Ok(version) => debug!(program = self.tools.counter.program(), version = %version, "counter available"),
            Err(e) if e.is_run_fatal() => {
                error!(error = %e, "counting tool unavailable, aborting before any repository");
                report.fatal = Some(e);
                return report;
            }
            Err(e) => warn!(error = %e, "counter probe failed, continuing"),
        }

        let workspace = match Workspace::create() {
            Ok(ws) => ws,
            Err(e) => {
                error!(error = %e, "cannot create temporary workspace");
                report.fatal = Some(e);
                return report;
            }
        };
        debug!(path = %workspace.path().display(), "workspace created");

        let total = selected.len();
        for (i, repo) in selected.into_iter().enumerate() {
            progress(i + 1, total, &repo.name);
            match self.analyze_repo(repo, &workspace) {
                Ok(outcome) => {
                    if let Some(anomaly) = outcome.anomaly {
                        report.anomalies.push(RepoAnomaly {
                            repo: repo.name.clone(),
                            anomaly,
                        });
                    }
                    report.results.push(outcome.result);
                }
                Err(failure) if failure.error.is_run_fatal() => {
                    error!(repo = %repo.name, stage = %failure.stage, error = %failure.error, "run aborted");
                    report.fatal = Some(failure.error);
                    break;
                }
                Err(failure) => {
                    warn!(repo = %repo.name, stage = %failure.stage, error = %failure.error, "skipping repository");
                    report.skipped.push(SkippedRepo {
                        repo: repo.name.clone(),
                        stage: failure.stage,
                        reason: failure.error.to_string(),
                    });
                }
            }
        }

        info!("{}", report.summary());
        report
    }

    /// Take one repository from `Start` to `Recorded`.
    pub fn analyze_repo(&self, repo: &RepoHandle, workspace: &Workspace) -> std::result::Result<RepoOutcome, StageFailure> {
        let history = self.tools.history;
        let config = &self.context.config;
        let mut stage = Stage::Start;
        let at = |stage: Stage| move |error: FirstDayError| StageFailure { stage, error };

        let first = locate_first_commit(history, repo).map_err(at(stage))?;
        stage = advance(repo, Stage::FirstCommitFound);

        let last = last_commit_within(history, repo, &first.timestamp, config.window.duration())
            .map_err(at(stage))?;
        stage = advance(repo, Stage::WindowCommitFound);

        let files = history
            .list_files(repo.path(), &last.hash)
            .map_err(at(stage))?;
        stage = advance(repo, Stage::TreeVerified);

        let mut row = AnalysisResult {
            repo: repo.name.clone(),
            date: first.date(),
            first_commit: first.hash.clone(),
            analysis_commit: last.hash.clone(),
            total_lines: 0,
            cost_estimate: 0.0,
        };

        if files.is_empty() {
            info!(repo = %repo.name, commit = %last.short(), "tree is empty, recording zero");
            advance(repo, Stage::Recorded);
            return Ok(RepoOutcome {
                result: row,
                anomaly: None,
            });
        }

        let snapshot = Extractor::new(history, self.tools.unpacker)
            .with_reconstruct_limit(config.extract.reconstruct_limit)
            .with_archive_format(config.extract.archive_format.clone())
            .extract(repo, &last.hash, workspace)
            .map_err(at(stage))?;
        stage = advance(repo, Stage::Extracted);

        let measurement = SizeCounter::new(self.tools.counter, self.context.cost_model())
            .count(&snapshot)
            .map_err(at(stage))?;
        advance(repo, Stage::Counted);

        row.total_lines = measurement.total_lines;
        row.cost_estimate = round_cents(measurement.cost);
        info!(
            repo = %repo.name,
            lines = row.total_lines,
            cost = row.cost_estimate,
            method = %snapshot.method,
            "first day measured"
        );
        advance(repo, Stage::Recorded);

        Ok(RepoOutcome {
            result: row,
            anomaly: measurement.anomaly,
        })
    }
}

fn advance(repo: &RepoHandle, next: Stage) -> Stage {
    debug!(repo = %repo.name, stage = %next, "stage reached");
    next
}

/// Convenience wrapper: analyze `repos` and hand back the report, or the fatal error.
pub fn analyze(tools: Toolset<'_>, context: AnalysisContext, repos: &[RepoHandle]) -> Result<RunReport> {
    let mut report = Analyzer::new(tools, context).run(repos);
    match report.fatal.take() {
        Some(e) if report.results.is_empty() => Err(e),
        other => {
            report.fatal = other;
            Ok(report)
        }
    }
}
