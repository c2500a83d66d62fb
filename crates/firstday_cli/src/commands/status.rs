//! Status command.

use anyhow::Result;
use console::style;
use firstday_core::{CommandRunner, GitCli, LineCounter, Sloccount, TarCli};
use std::path::Path;

/// Report which external tools are usable.
pub fn run(config: Option<&Path>) -> Result<()> {
    let config = super::load_config(config)?;
    let runner = CommandRunner::new(config.process.timeout());

    println!("External Tool Status:");
    println!();

    report("git", GitCli::new(runner.clone()).is_available());
    report("tar", TarCli::new(runner.clone()).is_available());

    let counter = Sloccount::new(runner, config.counter.program.clone(), config.counter.args.clone());
    match counter.probe() {
        Ok(version) => {
            report(counter.program(), true);
            if !version.is_empty() {
                println!("    Version: {}", version);
            }
        }
        Err(e) => {
            report(counter.program(), false);
            if let Some(hint) = e.recovery_suggestion() {
                println!();
                println!("  {}", hint);
            }
        }
    }

    Ok(())
}

fn report(name: &str, available: bool) {
    if available {
        println!("  {}: installed {}", name, style("✓").green());
    } else {
        println!("  {}: not found {}", name, style("✗").red());
    }
}
