// Scenario files for the CLI.
//
// A scenario is one set of uplift parameters plus filter selections. A filter
// dimension that is left out selects every value in the dataset (the default
// the original sidebar started from); an explicit empty list selects nothing.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::dataset::Dataset;
use crate::error::ConfigError;
use crate::types::{FilterCriteria, UpliftKind, UpliftParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: UpliftKind,
    /// Defaults to the kind's starting value (5% or $50/day).
    #[serde(default)]
    pub magnitude: Option<Decimal>,
    /// Defaults to the first month in the dataset.
    #[serde(default)]
    pub effective_month: Option<String>,
    #[serde(default)]
    pub branches: Option<Vec<String>>,
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(default)]
    pub teams: Option<Vec<String>>,
    #[serde(default)]
    pub job_titles: Option<Vec<String>>,
}

fn default_kind() -> UpliftKind {
    UpliftKind::Percentage
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: None,
            kind: default_kind(),
            magnitude: None,
            effective_month: None,
            branches: None,
            capabilities: None,
            teams: None,
            job_titles: None,
        }
    }
}

impl ScenarioConfig {
    pub fn params(&self, dataset: &Dataset) -> UpliftParams {
        let effective_month = self
            .effective_month
            .clone()
            .or_else(|| dataset.months().first().map(|m| m.label.clone()))
            .unwrap_or_default();
        UpliftParams {
            kind: self.kind,
            magnitude: self.magnitude.unwrap_or_else(|| self.kind.default_magnitude()),
            effective_month,
        }
    }

    pub fn criteria(&self, dataset: &Dataset) -> FilterCriteria {
        let all = FilterCriteria::all(dataset);
        FilterCriteria {
            branches: pick(&self.branches, all.branches),
            capabilities: pick(&self.capabilities, all.capabilities),
            teams: pick(&self.teams, all.teams),
            job_titles: pick(&self.job_titles, all.job_titles),
        }
    }
}

fn pick(selected: &Option<Vec<String>>, all: HashSet<String>) -> HashSet<String> {
    match selected {
        Some(values) => values.iter().map(|v| v.trim().to_string()).collect(),
        None => all,
    }
}

/// A scenario file holds either one scenario object or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScenarioFile {
    Many(Vec<ScenarioConfig>),
    One(ScenarioConfig),
}

pub fn parse_scenarios(json: &str) -> Result<Vec<ScenarioConfig>, ConfigError> {
    let parsed: ScenarioFile = serde_json::from_str(json)?;
    Ok(match parsed {
        ScenarioFile::Many(list) => list,
        ScenarioFile::One(one) => vec![one],
    })
}

pub fn load_scenarios(path: impl AsRef<Path>) -> Result<Vec<ScenarioConfig>, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_scenarios(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{MonthColumn, RateCardRow, RoleIdentity};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn dataset() -> Dataset {
        let months = vec![
            MonthColumn::new("Jul.2025", NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()),
            MonthColumn::new("Aug.2025", NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()),
        ];
        let rows = ["Sydney", "Perth"]
            .iter()
            .enumerate()
            .map(|(id, branch)| RateCardRow {
                id,
                identity: RoleIdentity::new(*branch, "Engineering", "Platform", "Developer"),
                charge_rate: Some(dec!(500)),
                cost_rate: Some(dec!(400)),
                revenue: vec![dec!(1000), dec!(1000)],
            })
            .collect();
        Dataset::new(months, rows).unwrap()
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let ds = dataset();
        let scenarios = parse_scenarios(r#"{"kind": "flat_amount"}"#).unwrap();
        let params = scenarios[0].params(&ds);
        assert_eq!(params.kind, UpliftKind::FlatAmount);
        assert_eq!(params.magnitude, dec!(50));
        assert_eq!(params.effective_month, "Jul.2025");
        assert_eq!(scenarios[0].criteria(&ds), FilterCriteria::all(&ds));
    }

    #[test]
    fn explicit_empty_list_selects_nothing() {
        let ds = dataset();
        let scenarios = parse_scenarios(r#"{"branches": []}"#).unwrap();
        let criteria = scenarios[0].criteria(&ds);
        assert!(criteria.branches.is_empty());
        assert_eq!(criteria.teams.len(), 1);
    }

    #[test]
    fn parses_a_list_of_named_scenarios() {
        let json = r#"[
            {"name": "five percent", "kind": "percentage", "magnitude": 5, "effective_month": "Aug.2025"},
            {"name": "sydney flat", "kind": "flat_amount", "magnitude": "75.50", "branches": ["Sydney"]}
        ]"#;
        let scenarios = parse_scenarios(json).unwrap();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].name.as_deref(), Some("five percent"));
        assert_eq!(scenarios[1].magnitude, Some(dec!(75.50)));
        let criteria = scenarios[1].criteria(&dataset());
        assert!(criteria.branches.contains("Sydney"));
        assert!(!criteria.branches.contains("Perth"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(parse_scenarios(r#"{"kind": "double"}"#).is_err());
    }
}
