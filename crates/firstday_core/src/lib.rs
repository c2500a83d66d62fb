//! First-day snapshot analysis for git repositories.
//!
//! For every repository the pipeline:
//! - locates the first commit reachable from HEAD
//! - picks the last commit within 24 hours of it
//! - materializes that commit's tree in a scoped temporary workspace
//! - counts physical source lines with sloccount
//! - prices the result with a basic COCOMO model
//!
//! # Quick Start
//!
//! ```no_run
//! use firstday_core::{
//!     discover_repositories, AnalysisContext, Analyzer, CommandRunner, Config, GitCli,
//!     Sloccount, TarCli, Toolset,
//! };
//! use std::path::Path;
//!
//! let config = Config::default();
//! let runner = CommandRunner::new(config.process.timeout());
//! let git = GitCli::new(runner.clone());
//! let tar = TarCli::new(runner.clone());
//! let sloc = Sloccount::new(runner, &config.counter.program, config.counter.args.clone());
//!
//! let repos = discover_repositories(Path::new("~/devel")).unwrap();
//! let tools = Toolset { history: &git, unpacker: &tar, counter: &sloc };
//! let report = Analyzer::new(tools, AnalysisContext::default()).run(&repos);
//! println!("{} lines, ${:.2}", report.total_lines(), report.total_cost());
//! ```
//!
//! # Cost estimation
//!
//! The estimator is a pure function and can be used on its own:
//!
//! ```
//! use firstday_core::estimate_cost;
//!
//! assert_eq!(estimate_cost(0, 1.0), 0.0);
//! assert_eq!(estimate_cost(1000, 1.0).round(), 140715.0);
//! ```

mod config;
mod cost;
mod count;
mod discover;
mod error;
mod extract;
mod git;
mod locate;
mod orchestrator;
mod process;
mod skiplist;
mod table;
mod types;
mod window;


pub use config::{
    Config, CostConfig, CounterConfig, ExtractConfig, ProcessConfig, SkipListConfig, WindowConfig,
    CONFIG_FILE, MAX_WINDOW_HOURS,
};
pub use cost::{estimate_cost, round_cents, CostModel, LanguageFactors, COEFFICIENT, EXPONENT, RATE};
pub use count::{
    count_source_files, parse_per_file, parse_report, parse_summary, LineCounter, ParsedCount,
    SizeCounter, Sloccount, SOURCE_EXTENSIONS,
};
pub use discover::{discover_repositories, expand_home};
pub use error::{FirstDayError, Result};
pub use extract::{
    count_files, Extractor, TarCli, Unpacker, Workspace, RECONSTRUCT_LIMIT, WORKSPACE_PREFIX,
};
pub use git::{GitCli, History, LOG_FORMAT};
pub use locate::{locate_first_commit, parse_log_line};
pub use orchestrator::{
    analyze, AnalysisContext, Analyzer, ProgressCallback, RepoAnomaly, RepoOutcome, RunReport,
    SkippedRepo, StageFailure, Toolset,
};
pub use process::{CommandRunner, Invocation, ProcessOutput};
pub use skiplist::SkipList;
pub use table::{
    read_results, recompute_costs, results_table, write_results, RecostReport, Table, COLUMNS,
    LANGUAGE_COLUMN,
};
pub use types::*;
pub use window::{default_window, last_commit_within};
