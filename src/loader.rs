use crate::dataset::{Dataset, MonthColumn, RateCardRow, RoleIdentity};
use crate::error::LoadError;
use crate::schema::{IdentityField, Schema};
use crate::util::parse_decimal_safe;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub summary_rows_excluded: usize,
    pub parse_errors: usize,
    pub defaulted_revenue_cells: usize,
    pub missing_rate_rows: usize,
}

/// Subtotal/grand-total lines exported alongside the roles.
pub fn is_summary_row(job_title: &str) -> bool {
    job_title.to_lowercase().contains("total")
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<(Dataset, LoadReport), LoadError> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading rate card");
    let file = std::fs::File::open(path)?;
    load_from_reader(file)
}

pub fn load_from_reader<R: Read>(reader: R) -> Result<(Dataset, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let schema = Schema::from_headers(rdr.headers()?.iter())?;
    debug!(
        months = schema.months.len(),
        charge_rate = schema.charge_rate.is_some(),
        cost_rate = schema.cost_rate.is_some(),
        "resolved rate card columns"
    );

    let mut report = LoadReport::default();
    let mut rows: Vec<RateCardRow> = Vec::new();

    for result in rdr.records() {
        report.total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "skipping unreadable record");
                report.parse_errors += 1;
                continue;
            }
        };

        let identity = read_identity(&record, &schema);
        if is_summary_row(&identity.job_title) {
            report.summary_rows_excluded += 1;
            continue;
        }

        let charge_rate = schema.charge_rate.and_then(|p| parse_decimal_safe(record.get(p)));
        let cost_rate = schema.cost_rate.and_then(|p| parse_decimal_safe(record.get(p)));
        if charge_rate.is_none() || cost_rate.is_none() {
            report.missing_rate_rows += 1;
        }

        let revenue: Vec<Decimal> = schema
            .months
            .iter()
            .map(|(pos, _)| {
                parse_decimal_safe(record.get(*pos)).unwrap_or_else(|| {
                    report.defaulted_revenue_cells += 1;
                    Decimal::ZERO
                })
            })
            .collect();

        rows.push(RateCardRow {
            id: rows.len(),
            identity,
            charge_rate,
            cost_rate,
            revenue,
        });
    }

    if report.missing_rate_rows > 0 {
        warn!(
            rows = report.missing_rate_rows,
            "roles without a charge or cost rate; flat uplifts and margins will skip them"
        );
    }

    report.loaded_rows = rows.len();
    let months: Vec<MonthColumn> = schema.months.into_iter().map(|(_, m)| m).collect();
    let dataset = Dataset::new(months, rows)?;
    info!(
        rows = report.loaded_rows,
        excluded = report.summary_rows_excluded,
        months = dataset.months().len(),
        "rate card loaded"
    );
    Ok((dataset, report))
}

fn read_identity(record: &StringRecord, schema: &Schema) -> RoleIdentity {
    let field = |f: IdentityField| {
        let value = record
            .get(schema.identity_position(f))
            .map(str::trim)
            .unwrap_or("");
        if value.is_empty() {
            "Unknown".to_string()
        } else {
            value.to_string()
        }
    };
    RoleIdentity {
        branch: field(IdentityField::Branch),
        capability: field(IdentityField::Capability),
        team: field(IdentityField::Team),
        job_title: field(IdentityField::JobTitle),
    }
}
