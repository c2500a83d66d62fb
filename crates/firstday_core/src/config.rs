//! Configuration types for first-day analysis runs.

use crate::error::{FirstDayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "firstday.toml";

/// Comprehensive configuration for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Window selection.
    #[serde(default)]
    pub window: WindowConfig,

    /// Snapshot extraction.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// External line counter.
    #[serde(default)]
    pub counter: CounterConfig,

    /// Cost model.
    #[serde(default)]
    pub cost: CostConfig,

    /// External process limits.
    #[serde(default)]
    pub process: ProcessConfig,

    /// Skip list location and fallback names.
    #[serde(default)]
    pub skiplist: SkipListConfig,
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| FirstDayError::ConfigError(format!("failed to read config: {}", e)))?;
            Self::from_toml(&content)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| FirstDayError::ConfigError(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FirstDayError::ConfigError(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| FirstDayError::ConfigError(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.window.hours <= 0 || self.window.hours > MAX_WINDOW_HOURS {
            return Err(FirstDayError::ConfigError(format!(
                "window.hours must be between 1 and {}, got {}",
                MAX_WINDOW_HOURS, self.window.hours
            )));
        }
        if self.counter.program.trim().is_empty() {
            return Err(FirstDayError::ConfigError(
                "counter.program must not be empty".to_string(),
            ));
        }
        if !(self.cost.coefficient > 0.0 && self.cost.exponent > 0.0 && self.cost.rate >= 0.0) {
            return Err(FirstDayError::ConfigError(
                "cost.coefficient and cost.exponent must be positive, cost.rate non-negative"
                    .to_string(),
            ));
        }
        if let Some((lang, factor)) = self
            .cost
            .language_factors
            .iter()
            .find(|(_, factor)| **factor <= 0.0)
        {
            return Err(FirstDayError::ConfigError(format!(
                "cost.language_factors.{} must be positive, got {}",
                lang, factor
            )));
        }
        Ok(())
    }
}

/// Longest accepted window, one hundred years.
pub const MAX_WINDOW_HOURS: i64 = 100 * 366 * 24;

/// Window selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Length of the window after the first commit, in hours (default: 24).
    pub hours: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { hours: 24 }
    }
}

impl WindowConfig {
    /// Returns the window as a chrono duration, clamped to `MAX_WINDOW_HOURS`.
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.hours.clamp(0, MAX_WINDOW_HOURS))
    }
}

/// Snapshot extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractConfig {
    /// Maximum number of files the per-file reconstruction writes (default: 20).
    pub reconstruct_limit: usize,

    /// Archive format passed to `git archive --format` (default: "tar").
    pub archive_format: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            reconstruct_limit: crate::extract::RECONSTRUCT_LIMIT,
            archive_format: "tar".to_string(),
        }
    }
}

/// External line counter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CounterConfig {
    /// Program to run (default: "sloccount").
    pub program: String,

    /// Flags passed before the directory argument.
    pub args: Vec<String>,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            program: "sloccount".to_string(),
            args: ["--duplicates", "--wide", "--details", "--follow"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Cost model configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CostConfig {
    /// Person-month coefficient A (default: 2.5).
    pub coefficient: f64,

    /// KSLOC exponent B (default: 1.05).
    pub exponent: f64,

    /// Currency units per person-month (default: 56286).
    pub rate: f64,

    /// Productivity factors keyed by lower-case language name.
    pub language_factors: BTreeMap<String, f64>,
}

impl Default for CostConfig {
    fn default() -> Self {
        let model = crate::cost::CostModel::default();
        Self {
            coefficient: model.coefficient,
            exponent: model.exponent,
            rate: model.rate,
            language_factors: crate::cost::LanguageFactors::default().into_map(),
        }
    }
}

/// External process limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProcessConfig {
    /// Per-invocation timeout in seconds; 0 disables it (default: 600).
    pub timeout_secs: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self { timeout_secs: 600 }
    }
}

impl ProcessConfig {
    /// Returns the timeout as a Duration, or None when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Skip list configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkipListConfig {
    /// Skip list file, relative to the current directory (default: "skiplist.txt").
    pub path: PathBuf,

    /// Names skipped when the file is absent or unreadable.
    pub defaults: Vec<String>,
}

impl Default for SkipListConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("skiplist.txt"),
            // Large initial commit imported from another repository
            defaults: vec!["narrative-learning-nextgen".to_string()],
        }
    }
}
