//! Uplift engine: select roles, reprice their revenue from the effective
//! month onward, compare against the baseline and recompute margins.
//!
//! Every call to [`run`] recomputes from scratch against a borrowed
//! [`Dataset`]; nothing is cached between runs.

pub mod aggregate;
pub mod margin;
pub mod recalc;
pub mod select;

use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::UpliftError;
use crate::types::{FilterCriteria, UpliftOutcome, UpliftParams, UpliftSummary};

pub use select::Partition;

pub fn run(
    dataset: &Dataset,
    criteria: &FilterCriteria,
    params: &UpliftParams,
) -> Result<UpliftOutcome, UpliftError> {
    params.validate()?;
    let range = dataset.eligible_months(&params.effective_month)?;
    debug!(
        effective_month = %params.effective_month,
        months = range.len(),
        "uplift range resolved"
    );

    let partition = select::partition(dataset.rows(), criteria);
    debug!(
        affected = partition.affected.len(),
        unaffected = partition.unaffected.len(),
        "roles partitioned"
    );

    let recalculated = recalc::recalculate(&partition.affected, range.clone(), params)?;
    let uplifted = aggregate::merge(recalculated, &partition.unaffected);
    let totals =
        aggregate::compare(dataset.months(), dataset.rows(), &uplifted, range.clone())?;
    let margins = margin::evaluate(&partition.affected, params)?;

    let summary = UpliftSummary {
        kind: params.kind,
        magnitude: params.magnitude,
        effective_month: params.effective_month.trim().to_string(),
        affected_rows: partition.affected.len(),
        unaffected_rows: partition.unaffected.len(),
        original_total: totals.original_total,
        uplifted_total: totals.uplifted_total,
        incremental: totals.incremental,
        average_margin_pct: margins.average_pct,
    };
    info!(
        kind = %summary.kind,
        magnitude = %summary.magnitude,
        affected = summary.affected_rows,
        incremental = %summary.incremental,
        "uplift computed"
    );

    Ok(UpliftOutcome {
        months: dataset.months()[range.clone()].to_vec(),
        first_month_index: range.start,
        summary,
        monthly: totals.monthly,
        uplifted,
        margins,
    })
}
