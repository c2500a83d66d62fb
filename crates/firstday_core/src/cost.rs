//! COCOMO-style cost estimation from a line count.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Person-month coefficient.
pub const COEFFICIENT: f64 = 2.5;
/// KSLOC exponent.
pub const EXPONENT: f64 = 1.05;
/// Currency units per person-month.
pub const RATE: f64 = 56286.0;

/// Parameters of the basic effort formula `cost = A * KSLOC^B * rate * factor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Coefficient A.
    pub coefficient: f64,
    /// Exponent B.
    pub exponent: f64,
    /// Cost of one person-month.
    pub rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            coefficient: COEFFICIENT,
            exponent: EXPONENT,
            rate: RATE,
        }
    }
}

impl CostModel {
    /// Effort in person-months for `lines` physical source lines.
    pub fn person_months(&self, lines: u64) -> f64 {
        if lines == 0 {
            return 0.0;
        }
        let ksloc = lines as f64 / 1000.0;
        self.coefficient * ksloc.powf(self.exponent)
    }

    /// Cost of `lines` scaled by a productivity factor.
    pub fn estimate(&self, lines: u64, productivity_factor: f64) -> f64 {
        self.person_months(lines) * self.rate * productivity_factor
    }
}

/// Cost of `lines` with the fixed default coefficients. Non-positive counts cost nothing.
pub fn estimate_cost(lines: i64, productivity_factor: f64) -> f64 {
    if lines <= 0 {
        return 0.0;
    }
    CostModel::default().estimate(lines as u64, productivity_factor)
}

/// Rounds a currency amount to cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Productivity multipliers per language. Below 1 reduces cost, above 1 increases it.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageFactors {
    factors: BTreeMap<String, f64>,
}

impl Default for LanguageFactors {
    fn default() -> Self {
        Self::from_map(
            [
                ("python", 0.7),
                ("golang", 0.9),
                ("haskell", 0.8),
                ("pascal", 1.1),
                ("c", 1.2),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        )
    }
}

impl LanguageFactors {
    /// Build from a map; keys are matched case-insensitively.
    pub fn from_map(map: BTreeMap<String, f64>) -> Self {
        Self {
            factors: map
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
        }
    }

    /// Factor for `language`, 1.0 when unknown.
    pub fn factor(&self, language: &str) -> f64 {
        self.factors
            .get(&language.trim().to_lowercase())
            .copied()
            .unwrap_or(1.0)
    }

    /// The underlying table.
    pub fn into_map(self) -> BTreeMap<String, f64> {
        self.factors
    }
}
