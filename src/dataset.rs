// In-memory rate card: roles, their daily rates and monthly revenue.
//
// A `Dataset` is built once (by the loader or by hand in tests) and then only
// borrowed by the uplift engine. Nothing in the engine caches or mutates it.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;

use crate::error::{DatasetError, UpliftError};

/// The four attributes a role is filtered on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RoleIdentity {
    pub branch: String,
    pub capability: String,
    pub team: String,
    pub job_title: String,
}

impl RoleIdentity {
    pub fn new(
        branch: impl Into<String>,
        capability: impl Into<String>,
        team: impl Into<String>,
        job_title: impl Into<String>,
    ) -> Self {
        Self {
            branch: branch.into(),
            capability: capability.into(),
            team: team.into(),
            job_title: job_title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateCardRow {
    /// Source ordinal, stable across partitioning and merging.
    pub id: usize,
    pub identity: RoleIdentity,
    pub charge_rate: Option<Decimal>,
    pub cost_rate: Option<Decimal>,
    /// One cell per dataset month, same order as `Dataset::months`.
    pub revenue: Vec<Decimal>,
}

/// A monthly revenue column. Its chronological index is its position in
/// `Dataset::months`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthColumn {
    pub label: String,
    pub start: NaiveDate,
}

impl MonthColumn {
    pub fn new(label: impl Into<String>, start: NaiveDate) -> Self {
        Self {
            label: label.into(),
            start,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    months: Vec<MonthColumn>,
    rows: Vec<RateCardRow>,
}

impl Dataset {
    /// Months must already be in chronological order and every row must carry
    /// exactly one revenue cell per month.
    pub fn new(months: Vec<MonthColumn>, rows: Vec<RateCardRow>) -> Result<Self, DatasetError> {
        if months.is_empty() {
            return Err(DatasetError::NoMonths);
        }
        for pair in months.windows(2) {
            if pair[1].start == pair[0].start {
                return Err(DatasetError::DuplicateMonth {
                    label: pair[1].label.clone(),
                });
            }
            if pair[1].start < pair[0].start {
                return Err(DatasetError::MonthsOutOfOrder {
                    previous: pair[0].label.clone(),
                    label: pair[1].label.clone(),
                });
            }
        }
        if let Some(bad) = rows.iter().find(|r| r.revenue.len() != months.len()) {
            return Err(DatasetError::RevenueLengthMismatch {
                row_id: bad.id,
                expected: months.len(),
                found: bad.revenue.len(),
            });
        }
        Ok(Self { months, rows })
    }

    pub fn months(&self) -> &[MonthColumn] {
        &self.months
    }

    pub fn rows(&self) -> &[RateCardRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn month_labels(&self) -> Vec<String> {
        self.months.iter().map(|m| m.label.clone()).collect()
    }

    pub fn month_index(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        self.months.iter().position(|m| m.label == label)
    }

    /// Index range of the months an uplift starting at `effective_month`
    /// applies to: that month through the last one.
    pub fn eligible_months(&self, effective_month: &str) -> Result<Range<usize>, UpliftError> {
        match self.month_index(effective_month) {
            Some(start) => Ok(start..self.months.len()),
            None => Err(UpliftError::InvalidEffectiveMonth {
                month: effective_month.to_string(),
                available: self.month_labels(),
            }),
        }
    }

    pub fn distinct_branches(&self) -> Vec<String> {
        self.distinct(|id| &id.branch)
    }

    pub fn distinct_capabilities(&self) -> Vec<String> {
        self.distinct(|id| &id.capability)
    }

    pub fn distinct_teams(&self) -> Vec<String> {
        self.distinct(|id| &id.team)
    }

    pub fn distinct_job_titles(&self) -> Vec<String> {
        self.distinct(|id| &id.job_title)
    }

    // First-seen order, like a dataframe's `unique()`.
    fn distinct<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(&RoleIdentity) -> &String,
    {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            let value = field(&row.identity);
            if seen.insert(value.as_str()) {
                out.push(value.clone());
            }
        }
        out
    }
}
