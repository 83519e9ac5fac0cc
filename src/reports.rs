use crate::engine::margin::current_margin;
use crate::types::{
    MarginReportRow, MonthlyComparisonRow, RenderedTable, SummaryLine, SummaryStats,
    UpliftKind, UpliftOutcome,
};
use crate::util::{format_currency, format_int, format_number, format_percent, format_rate};

pub fn summary_lines(outcome: &UpliftOutcome) -> Vec<SummaryLine> {
    let s = &outcome.summary;
    let uplift = match s.kind {
        UpliftKind::Percentage => format!("{}%", format_number(s.magnitude, 2)),
        UpliftKind::FlatAmount => format!("{} per day", format_rate(Some(s.magnitude))),
    };
    let line = |metric: &str, value: String| SummaryLine {
        metric: metric.to_string(),
        value,
    };
    vec![
        line("Uplift", uplift),
        line("Effective From", s.effective_month.clone()),
        line("Affected Roles", format_int(s.affected_rows)),
        line("Original Revenue (Post Month)", format_currency(s.original_total)),
        line("Uplifted Revenue", format_currency(s.uplifted_total)),
        line("Incremental Revenue", format_currency(s.incremental)),
        line(
            "Avg. New Margin % (Affected Roles)",
            format_percent(s.average_margin_pct),
        ),
    ]
}

pub fn monthly_rows(outcome: &UpliftOutcome) -> Vec<MonthlyComparisonRow> {
    outcome
        .monthly
        .iter()
        .map(|m| MonthlyComparisonRow {
            month: m.month.clone(),
            original: format_currency(m.original),
            uplifted: format_currency(m.uplifted),
            delta: format_currency(m.delta),
        })
        .collect()
}

/// Identity columns plus one currency column per uplifted month.
pub fn uplifted_table(outcome: &UpliftOutcome) -> RenderedTable {
    let mut headers: Vec<String> = ["Branch", "Capability", "Department / Team", "Job Title"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    headers.extend(outcome.months.iter().map(|m| m.label.clone()));

    let first = outcome.first_month_index;
    let rows = outcome
        .uplifted
        .iter()
        .map(|r| {
            let mut cells = vec![
                r.identity.branch.clone(),
                r.identity.capability.clone(),
                r.identity.team.clone(),
                r.identity.job_title.clone(),
            ];
            cells.extend(r.revenue[first..].iter().map(|v| format_currency(*v)));
            cells
        })
        .collect();
    RenderedTable { headers, rows }
}

pub fn margin_rows(outcome: &UpliftOutcome) -> Vec<MarginReportRow> {
    outcome
        .margins
        .rows
        .iter()
        .map(|m| {
            let (new_margin, note) = match m.margin_pct {
                Ok(pct) => (format_percent(Some(pct)), String::new()),
                Err(issue) => (format_percent(None), issue.to_string()),
            };
            MarginReportRow {
                branch: m.identity.branch.clone(),
                capability: m.identity.capability.clone(),
                team: m.identity.team.clone(),
                job_title: m.identity.job_title.clone(),
                charge_rate: format_rate(m.charge_rate),
                new_charge_rate: format_rate(m.new_charge_rate),
                cost_rate: format_rate(m.cost_rate),
                current_margin: format_percent(current_margin(m.charge_rate, m.cost_rate)),
                new_margin,
                note,
            }
        })
        .collect()
}

pub fn summary_stats(scenario: Option<&str>, outcome: &UpliftOutcome) -> SummaryStats {
    SummaryStats {
        scenario: scenario.map(str::to_string),
        summary: outcome.summary.clone(),
        flagged_margin_rows: outcome.margins.flagged().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, MonthColumn, RateCardRow, RoleIdentity};
    use crate::engine;
    use crate::types::{FilterCriteria, UpliftParams};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn outcome(criteria: impl Fn(&Dataset) -> FilterCriteria) -> UpliftOutcome {
        let months = vec![
            MonthColumn::new("Jun.2025", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
            MonthColumn::new("Jul.2025", NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()),
        ];
        let rows = vec![
            RateCardRow {
                id: 0,
                identity: RoleIdentity::new("Sydney", "Engineering", "Platform", "Developer"),
                charge_rate: Some(dec!(500)),
                cost_rate: Some(dec!(400)),
                revenue: vec![dec!(4000), dec!(5000)],
            },
            RateCardRow {
                id: 1,
                identity: RoleIdentity::new("Sydney", "Engineering", "Platform", "Intern"),
                charge_rate: None,
                cost_rate: Some(dec!(150)),
                revenue: vec![dec!(0), dec!(1200)],
            },
        ];
        let ds = Dataset::new(months, rows).unwrap();
        let params = UpliftParams::new(UpliftKind::Percentage, dec!(10), "Jul.2025");
        engine::run(&ds, &criteria(&ds), &params).unwrap()
    }

    #[test]
    fn summary_shows_currency_and_margin() {
        let lines = summary_lines(&outcome(FilterCriteria::all));
        let value = |name: &str| {
            lines
                .iter()
                .find(|l| l.metric == name)
                .map(|l| l.value.clone())
                .unwrap()
        };
        assert_eq!(value("Uplift"), "10.00%");
        assert_eq!(value("Original Revenue (Post Month)"), "$6,200");
        assert_eq!(value("Uplifted Revenue"), "$6,820");
        assert_eq!(value("Incremental Revenue"), "$620");
        assert_eq!(value("Avg. New Margin % (Affected Roles)"), "27.27%");
    }

    #[test]
    fn empty_selection_reports_undefined_margin() {
        let lines = summary_lines(&outcome(|_| FilterCriteria::default()));
        let margin = lines.last().unwrap();
        assert_eq!(margin.value, "n/a");
        assert_eq!(lines[5].value, "$0");
    }

    #[test]
    fn uplifted_table_has_month_columns_from_effective_month() {
        let table = uplifted_table(&outcome(FilterCriteria::all));
        assert_eq!(table.headers.len(), 5);
        assert_eq!(table.headers[4], "Jul.2025");
        assert_eq!(table.rows[0][4], "$5,500");
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn margin_rows_explain_exclusions() {
        let rows = margin_rows(&outcome(FilterCriteria::all));
        assert_eq!(rows[0].current_margin, "20.00%");
        assert_eq!(rows[0].new_margin, "27.27%");
        assert_eq!(rows[1].new_margin, "n/a");
        assert_eq!(rows[1].note, "missing charge rate");
    }

    #[test]
    fn monthly_rows_are_formatted() {
        let rows = monthly_rows(&outcome(FilterCriteria::all));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].delta, "$620");
    }
}
