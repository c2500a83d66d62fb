//! Analyze command.

use anyhow::{bail, Context, Result};
use console::style;
use firstday_core::{
    discover_repositories, expand_home, write_results, AnalysisContext, Analyzer, CommandRunner,
    GitCli, RunReport, SkipList, Sloccount, TarCli, Toolset,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Options of `firstday analyze`.
pub struct AnalyzeArgs {
    pub directory: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub skiplist: Option<PathBuf>,
    pub json: bool,
    pub window_hours: Option<i64>,
    pub reconstruct_limit: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// Run the pipeline over every repository below `args.directory`.
pub fn run(args: AnalyzeArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(hours) = args.window_hours {
        config.window.hours = hours;
    }
    if let Some(limit) = args.reconstruct_limit {
        config.extract.reconstruct_limit = limit;
    }
    if let Some(secs) = args.timeout_secs {
        config.process.timeout_secs = secs;
    }
    if let Some(path) = args.skiplist {
        config.skiplist.path = path;
    }
    config.validate()?;

    let skiplist = SkipList::load(&config.skiplist.path, &config.skiplist.defaults);
    let directory = expand_home(&args.directory);
    let repos = discover_repositories(&directory)
        .with_context(|| format!("listing repositories in {}", directory.display()))?;

    if !args.json {
        println!(
            "{} Found {} repositories in {}",
            style("→").cyan(),
            style(repos.len()).cyan(),
            directory.display()
        );
    }

    let runner = CommandRunner::new(config.process.timeout());
    let git = GitCli::new(runner.clone());
    let tar = TarCli::new(runner.clone());
    let sloccount = Sloccount::new(runner, config.counter.program.clone(), config.counter.args.clone());
    let tools = Toolset {
        history: &git,
        unpacker: &tar,
        counter: &sloccount,
    };
    let analyzer = Analyzer::new(tools, AnalysisContext::new(config, skiplist));

    let pb = if args.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(repos.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:30} [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("█▓▒░  "),
    );

    let pb_clone = pb.clone();
    let report = analyzer.run_with_progress(&repos, &move |current, total, name| {
        pb_clone.set_length(total as u64);
        pb_clone.set_position(current.saturating_sub(1) as u64);
        pb_clone.set_message(name.to_string());
    });
    pb.finish_and_clear();

    // Rows gathered before a fatal error are still written; an abort before
    // the first row leaves any previous table in place.
    let written = if report.has_table() {
        write_results(&args.output, &report.results)
            .with_context(|| format!("writing {}", args.output.display()))?;
        Some(args.output.as_path())
    } else {
        None
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, written);
    }

    if let Some(fatal) = &report.fatal {
        if let Some(hint) = fatal.recovery_suggestion() {
            eprintln!("{} {}", style("hint:").cyan(), hint);
        }
        bail!("analysis aborted: {}", fatal);
    }
    Ok(())
}

fn print_report(report: &RunReport, output: Option<&std::path::Path>) {
    println!();
    println!("{}", style("First-Day Analysis:").bold());
    for row in &report.results {
        println!(
            "  {:<30} {}  {:>8} lines  ${:>12.2}",
            row.repo,
            row.date,
            style(row.total_lines).cyan(),
            row.cost_estimate
        );
    }

    if !report.skipped.is_empty() {
        println!();
        println!("{}", style("Skipped:").yellow().bold());
        for skipped in &report.skipped {
            println!(
                "  {} {} ({}): {}",
                style("×").yellow(),
                skipped.repo,
                skipped.stage,
                skipped.reason
            );
        }
    }

    if !report.anomalies.is_empty() {
        println!();
        println!("{}", style("Anomalies:").red().bold());
        for a in &report.anomalies {
            println!("  {} {}: {}", style("!").red(), a.repo, a.anomaly);
        }
    }

    if !report.excluded.is_empty() {
        println!();
        println!("  Excluded by skip list: {}", report.excluded.join(", "));
    }

    println!();
    println!("  {}", report.summary());
    println!(
        "{} Total first-day output: {} lines, ${:.2}",
        style("✓").green(),
        style(report.total_lines()).cyan(),
        report.total_cost()
    );
    match output {
        Some(path) => println!("  Results written to {}", style(path.display()).cyan()),
        None => println!("  {}", style("No results written").yellow()),
    }
}
