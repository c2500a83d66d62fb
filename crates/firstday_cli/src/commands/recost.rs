//! Recost command.

use anyhow::{Context, Result};
use console::style;
use firstday_core::{recompute_costs, CostModel, LanguageFactors};
use std::path::Path;

/// Rewrite the cost column of `path` with the configured model.
pub fn run(path: &Path, config: Option<&Path>) -> Result<()> {
    let config = super::load_config(config)?;
    let model = CostModel {
        coefficient: config.cost.coefficient,
        exponent: config.cost.exponent,
        rate: config.cost.rate,
    };
    let factors = LanguageFactors::from_map(config.cost.language_factors);

    let report = recompute_costs(path, &factors, &model)
        .with_context(|| format!("recomputing costs in {}", path.display()))?;

    println!(
        "{} Updated {} rows in {}",
        style("✓").green(),
        style(report.updated).cyan(),
        path.display()
    );
    if report.invalid > 0 {
        println!(
            "  {} {} rows had a non-numeric total_lines; their cost was cleared",
            style("!").yellow(),
            report.invalid
        );
    }
    Ok(())
}
