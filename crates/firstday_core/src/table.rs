//! The persisted result table: comma-separated, one header row, six fixed columns.

use crate::cost::{CostModel, LanguageFactors};
use crate::error::{FirstDayError, Result};
use crate::types::AnalysisResult;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Column order of the result table.
pub const COLUMNS: [&str; 6] = [
    "repo",
    "date",
    "first_commit",
    "analysis_commit",
    "total_lines",
    "cost_estimate",
];

/// Optional column naming the dominant language of a row.
pub const LANGUAGE_COLUMN: &str = "language";

/// A header plus string rows, preserving column order and unknown columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column names.
    pub header: Vec<String>,
    /// Data rows, each padded or truncated to the header width.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse comma-separated text with double-quote escaping.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut records = parse_records(text)?.into_iter();
        let header = records.next().ok_or_else(|| "missing header row".to_string())?;
        let width = header.len();
        let rows = records
            .map(|mut r| {
                r.resize(width, String::new());
                r
            })
            .collect();
        Ok(Self { header, rows })
    }

    /// Read and parse a table file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|reason| FirstDayError::TableError {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Index of `name` in the header.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Render back to text, quoting fields that need it.
    pub fn render(&self) -> String {
        let mut out = String::new();
        write_record(&mut out, self.header.iter().map(String::as_str));
        for row in &self.rows {
            write_record(&mut out, row.iter().map(String::as_str));
        }
        out
    }

    /// Write the rendered table to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        Ok(())
    }
}

/// Build the output table for `results`, in the given order.
pub fn results_table(results: &[AnalysisResult]) -> Table {
    Table {
        header: COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: results
            .iter()
            .map(|r| {
                vec![
                    r.repo.clone(),
                    r.date.clone(),
                    r.first_commit.clone(),
                    r.analysis_commit.clone(),
                    r.total_lines.to_string(),
                    format!("{:.2}", r.cost_estimate),
                ]
            })
            .collect(),
    }
}

/// Write `results` as the six-column table.
pub fn write_results(path: &Path, results: &[AnalysisResult]) -> Result<()> {
    results_table(results).write(path)?;
    debug!(path = %path.display(), rows = results.len(), "wrote result table");
    Ok(())
}

/// Read a table written by [`write_results`].
pub fn read_results(path: &Path) -> Result<Vec<AnalysisResult>> {
    let table = Table::read(path)?;
    let invalid = |reason: String| FirstDayError::TableError {
        path: path.to_path_buf(),
        reason,
    };

    let mut idx = [0usize; 6];
    for (slot, name) in idx.iter_mut().zip(COLUMNS) {
        *slot = table
            .column(name)
            .ok_or_else(|| invalid(format!("missing column {}", name)))?;
    }

    table
        .rows
        .iter()
        .enumerate()
        .map(|(n, row)| {
            let total_lines = row[idx[4]]
                .parse()
                .map_err(|_| invalid(format!("row {}: bad total_lines {:?}", n + 1, row[idx[4]])))?;
            let cost_estimate = row[idx[5]]
                .parse()
                .map_err(|_| invalid(format!("row {}: bad cost_estimate {:?}", n + 1, row[idx[5]])))?;
            Ok(AnalysisResult {
                repo: row[idx[0]].clone(),
                date: row[idx[1]].clone(),
                first_commit: row[idx[2]].clone(),
                analysis_commit: row[idx[3]].clone(),
                total_lines,
                cost_estimate,
            })
        })
        .collect()
}

/// Outcome of [`recompute_costs`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecostReport {
    /// Rows whose cost was recomputed.
    pub updated: usize,
    /// Rows whose `total_lines` was not an integer; their cost was cleared.
    pub invalid: usize,
}

/// Recompute `cost_estimate` in place from `total_lines` and the optional `language` column.
///
/// Every other column keeps its value and position.
pub fn recompute_costs(path: &Path, factors: &LanguageFactors, model: &CostModel) -> Result<RecostReport> {
    let mut table = Table::read(path)?;
    let missing = |name: &str| FirstDayError::TableError {
        path: path.to_path_buf(),
        reason: format!("missing column {}", name),
    };
    let lines_col = table.column("total_lines").ok_or_else(|| missing("total_lines"))?;
    let cost_col = table
        .column("cost_estimate")
        .ok_or_else(|| missing("cost_estimate"))?;
    let lang_col = table.column(LANGUAGE_COLUMN);

    let mut report = RecostReport::default();
    for row in &mut table.rows {
        match row[lines_col].trim().parse::<i64>() {
            Ok(lines) => {
                let factor = lang_col.map_or(1.0, |c| factors.factor(&row[c]));
                let cost = if lines <= 0 {
                    0.0
                } else {
                    model.estimate(lines as u64, factor)
                };
                row[cost_col] = format!("{:.2}", cost);
                report.updated += 1;
            }
            Err(_) => {
                warn!(value = %row[lines_col], "total_lines is not an integer, clearing cost");
                row[cost_col] = String::new();
                report.invalid += 1;
            }
        }
    }

    table.write(path)?;
    Ok(report)
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}

fn parse_records(text: &str) -> std::result::Result<Vec<Vec<String>>, String> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}
