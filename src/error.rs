use rust_decimal::Decimal;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::UpliftKind;

/// Problems that stop an uplift run. Parameter errors are raised before any
/// computation starts; `Overflow` when a figure leaves the decimal range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpliftError {
    #[error(
        "effective month `{month}` is not a revenue month column (available: {})",
        .available.join(", ")
    )]
    InvalidEffectiveMonth {
        month: String,
        available: Vec<String>,
    },
    #[error("invalid {kind} uplift magnitude {magnitude}: {reason}")]
    InvalidMagnitude {
        kind: UpliftKind,
        magnitude: Decimal,
        reason: &'static str,
    },
    #[error(
        "{quantity} exceeds the decimal range{}",
        .row_id.map(|id| format!(" (row {id})")).unwrap_or_default()
    )]
    Overflow {
        quantity: &'static str,
        row_id: Option<usize>,
    },
}

impl UpliftError {
    pub(crate) fn overflow(quantity: &'static str, row_id: Option<usize>) -> Self {
        UpliftError::Overflow { quantity, row_id }
    }
}

/// Broken `Dataset` invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("dataset has no month columns")]
    NoMonths,
    #[error("month `{label}` appears more than once")]
    DuplicateMonth { label: String },
    #[error("month `{label}` is out of chronological order (follows `{previous}`)")]
    MonthsOutOfOrder { previous: String, label: String },
    #[error("row {row_id} has {found} revenue cells, expected {expected}")]
    RevenueLengthMismatch {
        row_id: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read rate card: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("column `{column}` appears more than once after header normalization")]
    DuplicateColumn { column: String },
    #[error("required column `{column}` not found (headers: {})", .seen.join(", "))]
    MissingColumn {
        column: &'static str,
        seen: Vec<String>,
    },
    #[error("no monthly revenue columns recognised (headers: {})", .seen.join(", "))]
    NoMonthColumns { seen: Vec<String> },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scenario file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create output directory {}", .dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {} under {}", .files.join(", "), .dir.display())]
    Write { dir: PathBuf, files: Vec<String> },
}

/// Row-level margin problems. These never abort a run; the row is flagged
/// and left out of the average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MarginIssue {
    #[error("new charge rate is zero")]
    UndefinedMargin,
    #[error("missing {0}")]
    MissingRateData(&'static str),
}
