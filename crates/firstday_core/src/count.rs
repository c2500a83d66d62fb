//! Counting source lines of a snapshot with sloccount.
//!
//! The tool's report is free text. Two independent parsers read it and the
//! first one that finds anything wins:
//!
//! - per-file: sums the leading counts of `--details` lines
//!   (`<lines> <language> <category> <path>`), independent of summary wording
//! - summary: reads the labeled `Total Physical Source Lines of Code` and
//!   `Total Estimated Cost to Develop` fields

use crate::cost::CostModel;
use crate::error::{FirstDayError, Result};
use crate::process::CommandRunner;
use crate::types::{Anomaly, ParseStrategy, SizeMeasurement, Snapshot};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions treated as source code when checking a zero count for plausibility.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "java", "c", "cpp", "h", "hpp", "cs", "go", "rs", "ts", "rb", "php",
];

/// A source-line counting tool.
pub trait LineCounter {
    /// Program name, for messages.
    fn program(&self) -> &str;

    /// Confirm the tool can be started, returning its version banner.
    ///
    /// # Errors
    ///
    /// Returns `CountingToolUnavailable` if the program does not exist.
    fn probe(&self) -> Result<String>;

    /// Run the tool over `dir` and return its standard output.
    fn run(&self, dir: &Path) -> Result<String>;
}

/// [`LineCounter`] backed by the `sloccount` command line.
#[derive(Debug, Clone)]
pub struct Sloccount {
    runner: CommandRunner,
    program: String,
    args: Vec<String>,
}

impl Sloccount {
    /// Create a counter invoking `program` with `args` before the directory.
    pub fn new(runner: CommandRunner, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            args,
        }
    }

    fn unavailable(&self, err: FirstDayError) -> FirstDayError {
        if err.is_program_missing() {
            FirstDayError::CountingToolUnavailable {
                program: self.program.clone(),
            }
        } else {
            err
        }
    }
}

impl LineCounter for Sloccount {
    fn program(&self) -> &str {
        &self.program
    }

    fn probe(&self) -> Result<String> {
        // Any exit status counts: only a missing executable is fatal.
        let out = self
            .runner
            .command(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| self.unavailable(e))?;
        Ok(out.stdout_lossy().trim().to_string())
    }

    fn run(&self, dir: &Path) -> Result<String> {
        let out = self
            .runner
            .command(&self.program)
            .args(&self.args)
            .arg(dir)
            .output()
            .map_err(|e| self.unavailable(e))?;
        if !out.success() {
            return Err(FirstDayError::CountingFailed {
                program: self.program.clone(),
                dir: dir.to_path_buf(),
                stderr: out.stderr_lossy(),
            });
        }
        Ok(out.stdout_lossy())
    }
}

/// Numbers read from one report by one parser.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCount {
    /// Parser that matched.
    pub strategy: ParseStrategy,
    /// Total physical lines.
    pub total_lines: u64,
    /// Number of per-file records summed (0 for summaries).
    pub files: usize,
    /// Cost figure printed by the tool, if any.
    pub reported_cost: Option<f64>,
}

type Parser = fn(&str) -> Option<ParsedCount>;

/// Parsers in priority order.
const PARSERS: [Parser; 2] = [parse_per_file, parse_summary];

fn detail_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)\s+([A-Za-z][\w+#-]*)\s+(\S.*)$").expect("valid detail regex")
    })
}

fn total_lines_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Total Physical Source Lines of Code \(SLOC\)\s*=\s*([0-9,]+)")
            .expect("valid total regex")
    })
}

fn total_cost_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Total Estimated Cost to Develop\s*=\s*\$\s*([0-9,]+(?:\.[0-9]+)?)")
            .expect("valid cost regex")
    })
}

/// Sum every `<lines> <language> ... <path>` record.
///
/// Summary rows such as `1000  top_dir  ansic=1000` are not file records and are ignored.
pub fn parse_per_file(output: &str) -> Option<ParsedCount> {
    let mut total = 0u64;
    let mut files = 0usize;
    for line in output.lines() {
        let Some(caps) = detail_line().captures(line.trim_end()) else {
            continue;
        };
        if caps[3].contains('=') {
            continue;
        }
        let Ok(lines) = caps[1].parse::<u64>() else {
            continue;
        };
        total += lines;
        files += 1;
    }
    (files > 0).then_some(ParsedCount {
        strategy: ParseStrategy::PerFile,
        total_lines: total,
        files,
        reported_cost: None,
    })
}

/// Read the labeled totals of the summary section.
pub fn parse_summary(output: &str) -> Option<ParsedCount> {
    let lines = total_lines_label()
        .captures(output)
        .and_then(|c| strip_thousands(&c[1]).parse::<u64>().ok())?;
    let cost = total_cost_label()
        .captures(output)
        .and_then(|c| strip_thousands(&c[1]).parse::<f64>().ok());
    Some(ParsedCount {
        strategy: ParseStrategy::Summary,
        total_lines: lines,
        files: 0,
        reported_cost: cost,
    })
}

fn strip_thousands(s: &str) -> String {
    s.replace(',', "")
}

/// Run every parser in order and keep the first result.
pub fn parse_report(output: &str) -> Option<ParsedCount> {
    PARSERS.iter().find_map(|parse| parse(output))
}

/// Number of files below `dir` with a [`SOURCE_EXTENSIONS`] extension.
pub fn count_source_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|x| x.to_str())
                .map_or(false, |x| SOURCE_EXTENSIONS.contains(&x))
        })
        .count()
}

/// Measures snapshots with a [`LineCounter`] and a cost model.
pub struct SizeCounter<'a> {
    counter: &'a dyn LineCounter,
    model: CostModel,
}

impl<'a> SizeCounter<'a> {
    /// Create a size counter.
    pub fn new(counter: &'a dyn LineCounter, model: CostModel) -> Self {
        Self { counter, model }
    }

    /// Count the lines of `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `CountingToolUnavailable` if the tool is missing and
    /// `CountingFailed` if it exits with an error. A report that neither
    /// parser understands is a zero measurement, flagged as an anomaly when
    /// the snapshot holds source files.
    pub fn count(&self, snapshot: &Snapshot) -> Result<SizeMeasurement> {
        let report = self.counter.run(&snapshot.root)?;
        debug!(
            repo = %snapshot.repo_name,
            chars = report.len(),
            "{} report received",
            self.counter.program()
        );
        Ok(self.measure(&report, &snapshot.root))
    }

    /// Turn a report for `dir` into a measurement.
    pub fn measure(&self, report: &str, dir: &Path) -> SizeMeasurement {
        let mut measurement = match parse_report(report) {
            Some(parsed) => {
                debug!(strategy = ?parsed.strategy, lines = parsed.total_lines, files = parsed.files, "parsed report");
                let cost = match (parsed.strategy, parsed.reported_cost) {
                    (ParseStrategy::Summary, Some(reported)) => reported,
                    _ => self.model.estimate(parsed.total_lines, 1.0),
                };
                SizeMeasurement {
                    total_lines: parsed.total_lines,
                    cost,
                    strategy: Some(parsed.strategy),
                    anomaly: None,
                }
            }
            None => SizeMeasurement::zero(),
        };

        if measurement.total_lines == 0 {
            let source_files = count_source_files(dir);
            if source_files > 0 {
                let anomaly = Anomaly::AnomalousZeroCount { source_files };
                warn!(dir = %dir.display(), "{}", anomaly);
                measurement.anomaly = Some(anomaly);
            }
        }
        measurement
    }
}
