//! firstday - measure what each repository looked like after its first day.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "firstday")]
#[command(about = "First-day size and cost estimates for git repositories", long_about = None)]
#[command(version)]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Log debug detail
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every repository below a directory
    Analyze {
        /// Directory whose children are repositories
        #[arg(short = 'd', long, default_value = "~/devel")]
        directory: PathBuf,
        /// Result table to write
        #[arg(short, long, default_value = "first_day_analysis.csv")]
        output: PathBuf,
        /// Config file (default: firstday.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip list file
        #[arg(long)]
        skiplist: Option<PathBuf>,
        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
        /// Window length in hours
        #[arg(long)]
        window_hours: Option<i64>,
        /// Maximum files written by per-file reconstruction
        #[arg(long)]
        reconstruct_limit: Option<usize>,
        /// Timeout per external process in seconds (0 disables)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Recompute the cost column of an existing result table
    Recost {
        /// Result table to rewrite
        #[arg(default_value = "first_day_analysis.csv")]
        path: PathBuf,
        /// Config file supplying the cost model and language factors
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check availability of git, tar and the counting tool
    Status {
        /// Config file naming the counting tool
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the flags when set
    let default_level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            directory,
            output,
            config,
            skiplist,
            json,
            window_hours,
            reconstruct_limit,
            timeout_secs,
        } => commands::analyze::run(commands::analyze::AnalyzeArgs {
            directory,
            output,
            config,
            skiplist,
            json,
            window_hours,
            reconstruct_limit,
            timeout_secs,
        }),
        Commands::Recost { path, config } => commands::recost::run(&path, config.as_deref()),
        Commands::Status { config } => commands::status::run(config.as_deref()),
    }
}
