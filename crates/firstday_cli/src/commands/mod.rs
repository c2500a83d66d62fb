//! CLI commands.

pub mod analyze;
pub mod recost;
pub mod status;

use anyhow::{Context, Result};
use firstday_core::{Config, CONFIG_FILE};
use std::path::Path;

/// Load `path`, or `firstday.toml` in the current directory when none is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
    Config::load(path).with_context(|| format!("loading {}", path.display()))
}
