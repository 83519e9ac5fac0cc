// Column schema for rate card exports.
//
// Every header is tagged with an explicit role instead of being guessed from
// substrings at each use site. Identity and rate columns are recognised by a
// fixed alias table; anything that parses as a calendar month is a revenue
// column; the rest is ignored.
use chrono::{Datelike, Month, NaiveDate};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use crate::dataset::MonthColumn;
use crate::error::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Branch,
    Capability,
    Team,
    JobTitle,
}

impl IdentityField {
    pub const ALL: [IdentityField; 4] = [
        IdentityField::Branch,
        IdentityField::Capability,
        IdentityField::Team,
        IdentityField::JobTitle,
    ];

    pub fn header(self) -> &'static str {
        match self {
            IdentityField::Branch => "Branch",
            IdentityField::Capability => "Capability",
            IdentityField::Team => "Department / Team",
            IdentityField::JobTitle => "Job Title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateField {
    Charge,
    Cost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Identity(IdentityField),
    Rate(RateField),
    Month(NaiveDate),
    Other,
}

// Keys are lowercase, whitespace-collapsed headers.
static HEADER_ALIASES: Lazy<HashMap<&'static str, ColumnRole>> = Lazy::new(|| {
    use ColumnRole::{Identity, Rate};
    HashMap::from([
        ("branch", Identity(IdentityField::Branch)),
        ("capability", Identity(IdentityField::Capability)),
        ("department / team", Identity(IdentityField::Team)),
        ("department/team", Identity(IdentityField::Team)),
        ("department", Identity(IdentityField::Team)),
        ("team", Identity(IdentityField::Team)),
        ("job title", Identity(IdentityField::JobTitle)),
        ("job", Identity(IdentityField::JobTitle)),
        ("role", Identity(IdentityField::JobTitle)),
        ("charge rate daily", Rate(RateField::Charge)),
        ("charge rate per day", Rate(RateField::Charge)),
        ("charge rate", Rate(RateField::Charge)),
        ("cost rate daily", Rate(RateField::Cost)),
        ("cost rate per day", Rate(RateField::Cost)),
        ("cost rate", Rate(RateField::Cost)),
    ])
});

/// Trim and collapse runs of internal whitespace.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn classify(header: &str) -> ColumnRole {
    let key = normalize_header(header).to_lowercase();
    if let Some(role) = HEADER_ALIASES.get(key.as_str()) {
        return *role;
    }
    match parse_month_label(header) {
        Some(start) => ColumnRole::Month(start),
        None => ColumnRole::Other,
    }
}

/// First day of the month a header names, if it names one.
///
/// Accepts ISO dates (`2025-07`, `2025-07-01`, `2025-07-01 00:00:00`) and
/// month-name labels with a 2 or 4 digit year (`Jul.2025`, `Jul-25`,
/// `July 2025`, `2025 Jul`).
pub fn parse_month_label(label: &str) -> Option<NaiveDate> {
    let s = label.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.with_day(1);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Some(d);
    }

    let parts: Vec<&str> = s
        .split(|c: char| matches!(c, '.' | '-' | ' ' | '/' | '_'))
        .filter(|p| !p.is_empty())
        .collect();
    let [a, b] = parts.as_slice() else {
        return None;
    };
    let (month, year) = match (a.parse::<Month>(), b.parse::<Month>()) {
        (Ok(m), Err(_)) => (m, parse_year(b)?),
        (Err(_), Ok(m)) => (m, parse_year(a)?),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month.number_from_month(), 1)
}

fn parse_year(s: &str) -> Option<i32> {
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let y: i32 = s.parse().ok()?;
    match s.len() {
        2 => Some(2000 + y),
        4 => Some(y),
        _ => None,
    }
}

/// Header positions resolved for a rate card file.
#[derive(Debug, Clone)]
pub struct Schema {
    pub headers: Vec<String>,
    identity: HashMap<IdentityField, usize>,
    pub charge_rate: Option<usize>,
    pub cost_rate: Option<usize>,
    /// Revenue columns in chronological order with their file positions.
    pub months: Vec<(usize, MonthColumn)>,
}

impl Schema {
    pub fn from_headers<'a, I>(raw: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let headers: Vec<String> = raw.into_iter().map(normalize_header).collect();

        let mut seen: HashSet<&str> = HashSet::new();
        for h in &headers {
            if !h.is_empty() && !seen.insert(h.as_str()) {
                return Err(LoadError::DuplicateColumn { column: h.clone() });
            }
        }

        let mut identity = HashMap::new();
        let mut charge_rate = None;
        let mut cost_rate = None;
        let mut months = Vec::new();
        for (pos, h) in headers.iter().enumerate() {
            match classify(h) {
                // Leftmost column wins when several share a role.
                ColumnRole::Identity(field) => {
                    identity.entry(field).or_insert(pos);
                }
                ColumnRole::Rate(RateField::Charge) => {
                    charge_rate.get_or_insert(pos);
                }
                ColumnRole::Rate(RateField::Cost) => {
                    cost_rate.get_or_insert(pos);
                }
                ColumnRole::Month(start) => months.push((pos, MonthColumn::new(h.clone(), start))),
                ColumnRole::Other => {}
            }
        }

        for field in IdentityField::ALL {
            if !identity.contains_key(&field) {
                return Err(LoadError::MissingColumn {
                    column: field.header(),
                    seen: headers,
                });
            }
        }
        if months.is_empty() {
            return Err(LoadError::NoMonthColumns { seen: headers });
        }
        months.sort_by_key(|(_, m)| m.start);

        Ok(Self {
            headers,
            identity,
            charge_rate,
            cost_rate,
            months,
        })
    }

    pub fn identity_position(&self, field: IdentityField) -> usize {
        self.identity[&field]
    }
}
