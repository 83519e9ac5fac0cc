use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tabled::Tabled;

use crate::dataset::{Dataset, MonthColumn, RateCardRow, RoleIdentity};
use crate::error::{MarginIssue, UpliftError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum UpliftKind {
    /// Scale revenue and charge rate by `magnitude` percent.
    Percentage,
    /// Add `magnitude` currency units to the daily charge rate.
    FlatAmount,
}

impl UpliftKind {
    /// The value the sidebar of the original tool started from.
    pub fn default_magnitude(self) -> Decimal {
        match self {
            UpliftKind::Percentage => dec!(5),
            UpliftKind::FlatAmount => dec!(50),
        }
    }

    /// Charge rate after the uplift is applied, `None` on overflow.
    pub fn uplift_rate(self, rate: Decimal, magnitude: Decimal) -> Option<Decimal> {
        match self {
            UpliftKind::Percentage => rate.checked_mul(percent_factor(magnitude)),
            UpliftKind::FlatAmount => rate.checked_add(magnitude),
        }
    }
}

impl fmt::Display for UpliftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpliftKind::Percentage => write!(f, "percentage"),
            UpliftKind::FlatAmount => write!(f, "flat amount"),
        }
    }
}

/// `1 + magnitude / 100`. Cannot overflow: `magnitude / 100` is far inside
/// the decimal range.
pub fn percent_factor(magnitude: Decimal) -> Decimal {
    Decimal::ONE + magnitude / dec!(100)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpliftParams {
    pub kind: UpliftKind,
    pub magnitude: Decimal,
    pub effective_month: String,
}

impl UpliftParams {
    pub fn new(kind: UpliftKind, magnitude: Decimal, effective_month: impl Into<String>) -> Self {
        Self {
            kind,
            magnitude,
            effective_month: effective_month.into(),
        }
    }

    pub fn validate(&self) -> Result<(), UpliftError> {
        let reason = if self.magnitude < Decimal::ZERO {
            Some("must not be negative")
        } else if self.kind == UpliftKind::Percentage && self.magnitude > dec!(100) {
            Some("percentage must be at most 100")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(UpliftError::InvalidMagnitude {
                kind: self.kind,
                magnitude: self.magnitude,
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Accepted values per identity dimension. A role is selected only when all
/// four of its attributes are accepted; an empty set accepts nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub branches: HashSet<String>,
    pub capabilities: HashSet<String>,
    pub teams: HashSet<String>,
    pub job_titles: HashSet<String>,
}

impl FilterCriteria {
    /// Every value observed in the dataset, i.e. select all roles.
    pub fn all(dataset: &Dataset) -> Self {
        Self {
            branches: dataset.distinct_branches().into_iter().collect(),
            capabilities: dataset.distinct_capabilities().into_iter().collect(),
            teams: dataset.distinct_teams().into_iter().collect(),
            job_titles: dataset.distinct_job_titles().into_iter().collect(),
        }
    }

    pub fn matches(&self, identity: &RoleIdentity) -> bool {
        self.branches.contains(&identity.branch)
            && self.capabilities.contains(&identity.capability)
            && self.teams.contains(&identity.team)
            && self.job_titles.contains(&identity.job_title)
    }
}

/// One row of the monthly comparison table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyComparison {
    pub month: String,
    pub original: Decimal,
    pub uplifted: Decimal,
    pub delta: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarginRow {
    pub id: usize,
    pub identity: RoleIdentity,
    pub charge_rate: Option<Decimal>,
    pub cost_rate: Option<Decimal>,
    pub new_charge_rate: Option<Decimal>,
    pub margin_pct: Result<Decimal, MarginIssue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarginReport {
    pub rows: Vec<MarginRow>,
    /// Mean of the defined margins; `None` when there are none.
    pub average_pct: Option<Decimal>,
}

impl MarginReport {
    pub fn flagged(&self) -> impl Iterator<Item = &MarginRow> {
        self.rows.iter().filter(|r| r.margin_pct.is_err())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpliftSummary {
    pub kind: UpliftKind,
    pub magnitude: Decimal,
    pub effective_month: String,
    pub affected_rows: usize,
    pub unaffected_rows: usize,
    pub original_total: Decimal,
    pub uplifted_total: Decimal,
    pub incremental: Decimal,
    /// Serialized as `null` when no affected role has a defined margin.
    pub average_margin_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpliftOutcome {
    /// Months the uplift applied to, effective month first.
    pub months: Vec<MonthColumn>,
    /// Position of `months[0]` in the source dataset.
    pub first_month_index: usize,
    pub summary: UpliftSummary,
    pub monthly: Vec<MonthlyComparison>,
    /// Recalculated affected rows followed by the untouched unaffected rows.
    pub uplifted: Vec<RateCardRow>,
    pub margins: MarginReport,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SummaryLine {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyComparisonRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Original")]
    #[tabled(rename = "Original")]
    pub original: String,
    #[serde(rename = "Uplifted")]
    #[tabled(rename = "Uplifted")]
    pub uplifted: String,
    #[serde(rename = "Delta")]
    #[tabled(rename = "Delta")]
    pub delta: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MarginReportRow {
    #[serde(rename = "Branch")]
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[serde(rename = "Capability")]
    #[tabled(rename = "Capability")]
    pub capability: String,
    #[serde(rename = "Department / Team")]
    #[tabled(rename = "Department / Team")]
    pub team: String,
    #[serde(rename = "Job Title")]
    #[tabled(rename = "Job Title")]
    pub job_title: String,
    #[serde(rename = "Charge Rate")]
    #[tabled(rename = "Charge Rate")]
    pub charge_rate: String,
    #[serde(rename = "New Charge Rate")]
    #[tabled(rename = "New Charge Rate")]
    pub new_charge_rate: String,
    #[serde(rename = "Cost Rate")]
    #[tabled(rename = "Cost Rate")]
    pub cost_rate: String,
    #[serde(rename = "Current Margin %")]
    #[tabled(rename = "Current Margin %")]
    pub current_margin: String,
    #[serde(rename = "New Margin %")]
    #[tabled(rename = "New Margin %")]
    pub new_margin: String,
    #[serde(rename = "Note")]
    #[tabled(rename = "Note")]
    pub note: String,
}

/// A table whose columns are only known at runtime (one per uplifted month).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub scenario: Option<String>,
    #[serde(flatten)]
    pub summary: UpliftSummary,
    pub flagged_margin_rows: usize,
}
