use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing::{error, info};

use crate::error::ExportError;
use crate::reports;
use crate::types::{RenderedTable, UpliftOutcome};

pub const REPORT_FILES: [&str; 4] = [
    "monthly_comparison.csv",
    "uplifted_roles.csv",
    "margin_report.csv",
    "summary.json",
];

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_table_csv(path: &Path, table: &RenderedTable) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Write every report for `outcome` under `dir`, creating it if needed.
///
/// All files are attempted; the error names each one that could not be
/// written.
pub fn export_reports(
    dir: &Path,
    scenario: Option<&str>,
    outcome: &UpliftOutcome,
) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let [monthly_file, roles_file, margin_file, summary_file] = REPORT_FILES;
    let results = [
        write_csv(&dir.join(monthly_file), &reports::monthly_rows(outcome)),
        write_table_csv(&dir.join(roles_file), &reports::uplifted_table(outcome)),
        write_csv(&dir.join(margin_file), &reports::margin_rows(outcome)),
        write_json(
            &dir.join(summary_file),
            &reports::summary_stats(scenario, outcome),
        ),
    ];
    let mut failed = Vec::new();
    for (file, result) in REPORT_FILES.iter().zip(results) {
        if let Err(e) = result {
            error!(file = %file, "write error: {}", e);
            failed.push(file.to_string());
        }
    }
    if !failed.is_empty() {
        return Err(ExportError::Write {
            dir: dir.to_path_buf(),
            files: failed,
        });
    }
    info!(dir = %dir.display(), "reports exported");
    Ok(())
}

pub fn render_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn render_table(table: &RenderedTable, max_rows: usize) -> String {
    if table.rows.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(table.headers.iter().cloned());
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(row.iter().cloned());
    }
    let mut rendered = builder.build();
    rendered.with(Style::markdown());
    rendered.to_string()
}

pub fn preview_rows<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", title);
    println!("{}", render_rows(rows, max_rows));
    if rows.len() > max_rows {
        println!("({} more rows not shown)", rows.len() - max_rows);
    }
    println!();
}

pub fn preview_table(title: &str, table: &RenderedTable, max_rows: usize) {
    println!("{}\n", title);
    println!("{}", render_table(table, max_rows));
    if table.rows.len() > max_rows {
        println!("({} more rows not shown)", table.rows.len() - max_rows);
    }
    println!();
}
