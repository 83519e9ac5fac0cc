use rust_decimal::Decimal;
use std::ops::Range;

use crate::dataset::{MonthColumn, RateCardRow};
use crate::error::UpliftError;
use crate::types::MonthlyComparison;
use crate::util::checked_sum;

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub monthly: Vec<MonthlyComparison>,
    pub original_total: Decimal,
    pub uplifted_total: Decimal,
    pub incremental: Decimal,
}

/// Recalculated affected rows first, then the unaffected rows untouched.
pub fn merge(recalculated: Vec<RateCardRow>, unaffected: &[&RateCardRow]) -> Vec<RateCardRow> {
    let mut out = recalculated;
    out.reserve(unaffected.len());
    out.extend(unaffected.iter().map(|r| (*r).clone()));
    out
}

/// Per-month and grand totals of both datasets over `range`. Totals are the
/// sum of the monthly figures, so the monthly deltas always add up to
/// `incremental`.
pub fn compare(
    months: &[MonthColumn],
    original: &[RateCardRow],
    uplifted: &[RateCardRow],
    range: Range<usize>,
) -> Result<Aggregation, UpliftError> {
    let monthly = range
        .map(|idx| -> Result<MonthlyComparison, UpliftError> {
            let before = month_sum(original, idx)
                .ok_or_else(|| UpliftError::overflow("original monthly total", None))?;
            let after = month_sum(uplifted, idx)
                .ok_or_else(|| UpliftError::overflow("uplifted monthly total", None))?;
            Ok(MonthlyComparison {
                month: months[idx].label.clone(),
                original: before,
                uplifted: after,
                delta: after
                    .checked_sub(before)
                    .ok_or_else(|| UpliftError::overflow("monthly delta", None))?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let original_total = checked_sum(monthly.iter().map(|m| m.original))
        .ok_or_else(|| UpliftError::overflow("original revenue total", None))?;
    let uplifted_total = checked_sum(monthly.iter().map(|m| m.uplifted))
        .ok_or_else(|| UpliftError::overflow("uplifted revenue total", None))?;
    let incremental = uplifted_total
        .checked_sub(original_total)
        .ok_or_else(|| UpliftError::overflow("incremental revenue", None))?;
    Ok(Aggregation {
        monthly,
        original_total,
        uplifted_total,
        incremental,
    })
}

/// Revenue of every row in month `idx`, `None` on overflow.
pub fn month_sum(rows: &[RateCardRow], idx: usize) -> Option<Decimal> {
    checked_sum(rows.iter().filter_map(|r| r.revenue.get(idx)).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RoleIdentity;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn months() -> Vec<MonthColumn> {
        (1..=3)
            .map(|m| {
                MonthColumn::new(
                    format!("M{m}"),
                    NaiveDate::from_ymd_opt(2025, m, 1).unwrap(),
                )
            })
            .collect()
    }

    fn role(id: usize, revenue: Vec<Decimal>) -> RateCardRow {
        RateCardRow {
            id,
            identity: RoleIdentity::new("Sydney", "Engineering", "Platform", "Developer"),
            charge_rate: Some(dec!(500)),
            cost_rate: Some(dec!(400)),
            revenue,
        }
    }

    #[test]
    fn merge_puts_affected_first() {
        let a = role(3, vec![dec!(1), dec!(1), dec!(1)]);
        let u1 = role(0, vec![dec!(2), dec!(2), dec!(2)]);
        let u2 = role(1, vec![dec!(4), dec!(4), dec!(4)]);
        let merged = merge(vec![a], &[&u1, &u2]);
        let ids: Vec<usize> = merged.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 0, 1]);
    }

    #[test]
    fn compares_only_months_in_range() {
        let original = vec![
            role(0, vec![dec!(100), dec!(200), dec!(300)]),
            role(1, vec![dec!(10), dec!(20), dec!(30)]),
        ];
        let uplifted = vec![
            role(0, vec![dec!(100), dec!(220), dec!(330)]),
            role(1, vec![dec!(10), dec!(20), dec!(30)]),
        ];
        let agg = compare(&months(), &original, &uplifted, 1..3).unwrap();
        assert_eq!(agg.monthly.len(), 2);
        assert_eq!(agg.monthly[0].month, "M2");
        assert_eq!(agg.monthly[0].original, dec!(220));
        assert_eq!(agg.monthly[0].uplifted, dec!(240));
        assert_eq!(agg.monthly[1].delta, dec!(30));
        assert_eq!(agg.original_total, dec!(550));
        assert_eq!(agg.uplifted_total, dec!(600));
        assert_eq!(agg.incremental, dec!(50));
    }

    #[test]
    fn monthly_deltas_add_up_to_incremental() {
        let original = vec![role(0, vec![dec!(1.10), dec!(2.25), dec!(3.333)])];
        let uplifted = vec![role(0, vec![dec!(1.21), dec!(2.475), dec!(3.6663)])];
        let agg = compare(&months(), &original, &uplifted, 0..3).unwrap();
        let sum: Decimal = agg.monthly.iter().map(|m| m.delta).sum();
        assert_eq!(sum, agg.incremental);
    }

    #[test]
    fn totals_past_the_decimal_range_are_reported() {
        let big = Decimal::MAX / dec!(2) + Decimal::ONE;
        let original = vec![role(0, vec![big, dec!(1), dec!(1)])];
        let uplifted = vec![
            role(0, vec![big, dec!(1), dec!(1)]),
            role(1, vec![big, dec!(1), dec!(1)]),
        ];
        let err = compare(&months(), &original, &uplifted, 0..3).unwrap_err();
        assert_eq!(
            err,
            UpliftError::Overflow {
                quantity: "uplifted monthly total",
                row_id: None,
            }
        );
    }
}
