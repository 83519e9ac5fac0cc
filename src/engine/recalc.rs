use rust_decimal::Decimal;
use std::ops::Range;

use crate::dataset::RateCardRow;
use crate::error::UpliftError;
use crate::types::{percent_factor, UpliftKind, UpliftParams};

/// Copies of the affected rows with revenue rewritten inside `months`.
/// Rates and cells outside the range are left as they were.
pub fn recalculate(
    affected: &[&RateCardRow],
    months: Range<usize>,
    params: &UpliftParams,
) -> Result<Vec<RateCardRow>, UpliftError> {
    affected
        .iter()
        .map(|row| -> Result<RateCardRow, UpliftError> {
            let mut out = (*row).clone();
            for cell in &mut out.revenue[months.clone()] {
                *cell = uplift_cell(*cell, row.charge_rate, params.kind, params.magnitude)
                    .ok_or_else(|| UpliftError::overflow("uplifted revenue", Some(row.id)))?;
            }
            Ok(out)
        })
        .collect()
}

/// New revenue for a single month, `None` if it overflows.
///
/// A flat uplift reprices the days implied by the old revenue at the bumped
/// daily rate, so a role billed fewer days that month gets less of it.
pub fn uplift_cell(
    revenue: Decimal,
    charge_rate: Option<Decimal>,
    kind: UpliftKind,
    magnitude: Decimal,
) -> Option<Decimal> {
    match kind {
        UpliftKind::Percentage => revenue.checked_mul(percent_factor(magnitude)),
        UpliftKind::FlatAmount => match charge_rate {
            Some(rate) => rate
                .checked_add(magnitude)?
                .checked_mul(implied_days(revenue, rate)),
            None => Some(Decimal::ZERO),
        },
    }
}

/// `revenue / rate`, or zero when the rate cannot imply any days.
pub fn implied_days(revenue: Decimal, rate: Decimal) -> Decimal {
    if rate.is_zero() {
        return Decimal::ZERO;
    }
    revenue.checked_div(rate).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RoleIdentity;
    use rust_decimal_macros::dec;

    fn role(charge: Option<Decimal>, revenue: Vec<Decimal>) -> RateCardRow {
        RateCardRow {
            id: 0,
            identity: RoleIdentity::new("Sydney", "Engineering", "Platform", "Developer"),
            charge_rate: charge,
            cost_rate: Some(dec!(400)),
            revenue,
        }
    }

    #[test]
    fn percentage_scales_revenue() {
        let v = uplift_cell(dec!(5000), Some(dec!(500)), UpliftKind::Percentage, dec!(10));
        assert_eq!(v, Some(dec!(5500)));
    }

    #[test]
    fn percentage_ignores_missing_rate() {
        let v = uplift_cell(dec!(2000), None, UpliftKind::Percentage, dec!(5));
        assert_eq!(v, Some(dec!(2100)));
    }

    #[test]
    fn flat_amount_reprices_implied_days() {
        // 6 days at 500 -> 6 days at 550, not 3000 + 50.
        let v = uplift_cell(dec!(3000), Some(dec!(500)), UpliftKind::FlatAmount, dec!(50));
        assert_eq!(v, Some(dec!(3300)));
    }

    #[test]
    fn flat_amount_with_no_days_is_zero() {
        assert_eq!(
            uplift_cell(Decimal::ZERO, Some(dec!(500)), UpliftKind::FlatAmount, dec!(50)),
            Some(Decimal::ZERO)
        );
        assert_eq!(
            uplift_cell(dec!(4000), Some(Decimal::ZERO), UpliftKind::FlatAmount, dec!(50)),
            Some(Decimal::ZERO)
        );
        assert_eq!(
            uplift_cell(dec!(4000), None, UpliftKind::FlatAmount, dec!(50)),
            Some(Decimal::ZERO)
        );
    }

    #[test]
    fn only_cells_in_range_change() {
        let row = role(Some(dec!(500)), vec![dec!(1000), dec!(2000), dec!(3000)]);
        let params = UpliftParams::new(UpliftKind::Percentage, dec!(10), "Mar.2025");
        let out = recalculate(&[&row], 2..3, &params).unwrap();
        assert_eq!(out[0].revenue, vec![dec!(1000), dec!(2000), dec!(3300)]);
        assert_eq!(out[0].charge_rate, Some(dec!(500)));
        assert_eq!(out[0].cost_rate, Some(dec!(400)));
        assert_eq!(row.revenue[2], dec!(3000));
    }

    #[test]
    fn huge_flat_amount_is_an_error_not_a_panic() {
        // 100 days at 500 repriced at 500 + 1e27 per day.
        let row = role(Some(dec!(500)), vec![dec!(50000)]);
        let params = UpliftParams::new(UpliftKind::FlatAmount, dec!(1e27), "Jul.2025");
        let err = recalculate(&[&row], 0..1, &params).unwrap_err();
        assert_eq!(
            err,
            UpliftError::Overflow {
                quantity: "uplifted revenue",
                row_id: Some(0),
            }
        );
    }
}
