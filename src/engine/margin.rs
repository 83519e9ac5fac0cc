use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

use crate::dataset::RateCardRow;
use crate::error::{MarginIssue, UpliftError};
use crate::types::{MarginReport, MarginRow, UpliftParams};
use crate::util::checked_sum;

/// New margin for each affected role, from rates alone. Revenue plays no part.
pub fn evaluate(
    affected: &[&RateCardRow],
    params: &UpliftParams,
) -> Result<MarginReport, UpliftError> {
    let rows = affected
        .iter()
        .map(|row| -> Result<MarginRow, UpliftError> {
            let new_charge_rate = match row.charge_rate {
                Some(rate) => Some(
                    params
                        .kind
                        .uplift_rate(rate, params.magnitude)
                        .ok_or_else(|| UpliftError::overflow("new charge rate", Some(row.id)))?,
                ),
                None => None,
            };
            let margin_pct = margin_for(new_charge_rate, row.cost_rate);
            if let Err(issue) = &margin_pct {
                warn!(
                    row = row.id,
                    job_title = %row.identity.job_title,
                    %issue,
                    "margin excluded from average"
                );
            }
            Ok(MarginRow {
                id: row.id,
                identity: row.identity.clone(),
                charge_rate: row.charge_rate,
                cost_rate: row.cost_rate,
                new_charge_rate,
                margin_pct,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let defined: Vec<Decimal> = rows
        .iter()
        .filter_map(|r| r.margin_pct.as_ref().ok().copied())
        .collect();
    let average_pct = if defined.is_empty() {
        None
    } else {
        let total = checked_sum(defined.iter().copied())
            .ok_or_else(|| UpliftError::overflow("margin total", None))?;
        Some(total / Decimal::from(defined.len()))
    };
    Ok(MarginReport { average_pct, rows })
}

/// `(charge - cost) / charge * 100`. A margin outside the decimal range is
/// undefined, like one over a zero charge rate.
pub fn margin_pct(charge_rate: Decimal, cost_rate: Decimal) -> Result<Decimal, MarginIssue> {
    if charge_rate.is_zero() {
        return Err(MarginIssue::UndefinedMargin);
    }
    charge_rate
        .checked_sub(cost_rate)
        .and_then(|diff| diff.checked_div(charge_rate))
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .ok_or(MarginIssue::UndefinedMargin)
}

fn margin_for(
    new_charge_rate: Option<Decimal>,
    cost_rate: Option<Decimal>,
) -> Result<Decimal, MarginIssue> {
    let charge = new_charge_rate.ok_or(MarginIssue::MissingRateData("charge rate"))?;
    let cost = cost_rate.ok_or(MarginIssue::MissingRateData("cost rate"))?;
    margin_pct(charge, cost)
}

/// Margin before any uplift, for side-by-side display.
pub fn current_margin(
    charge_rate: Option<Decimal>,
    cost_rate: Option<Decimal>,
) -> Option<Decimal> {
    margin_for(charge_rate, cost_rate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RoleIdentity;
    use crate::types::UpliftKind;

    fn role(id: usize, charge: Option<Decimal>, cost: Option<Decimal>) -> RateCardRow {
        RateCardRow {
            id,
            identity: RoleIdentity::new("Sydney", "Engineering", "Platform", "Developer"),
            charge_rate: charge,
            cost_rate: cost,
            revenue: vec![dec!(5000)],
        }
    }

    #[test]
    fn percentage_margin_matches_worked_example() {
        let row = role(0, Some(dec!(500)), Some(dec!(400)));
        let params = UpliftParams::new(UpliftKind::Percentage, dec!(10), "Jul.2025");
        let report = evaluate(&[&row], &params).unwrap();
        assert_eq!(report.rows[0].new_charge_rate, Some(dec!(550)));
        let pct = report.rows[0].margin_pct.unwrap();
        assert_eq!(pct.round_dp(2), dec!(27.27));
        assert_eq!(report.average_pct.map(|v| v.round_dp(2)), Some(dec!(27.27)));
    }

    #[test]
    fn flat_amount_adds_to_rate() {
        let row = role(0, Some(dec!(500)), Some(dec!(300)));
        let params = UpliftParams::new(UpliftKind::FlatAmount, dec!(100), "Jul.2025");
        let report = evaluate(&[&row], &params).unwrap();
        assert_eq!(report.rows[0].new_charge_rate, Some(dec!(600)));
        assert_eq!(report.rows[0].margin_pct, Ok(dec!(50)));
    }

    #[test]
    fn zero_charge_rate_is_flagged_and_skipped() {
        let zero = role(0, Some(Decimal::ZERO), Some(dec!(100)));
        let ok = role(1, Some(dec!(200)), Some(dec!(100)));
        let params = UpliftParams::new(UpliftKind::Percentage, dec!(0), "Jul.2025");
        let report = evaluate(&[&zero, &ok], &params).unwrap();
        assert_eq!(report.rows[0].margin_pct, Err(MarginIssue::UndefinedMargin));
        assert_eq!(report.average_pct, Some(dec!(50)));
        assert_eq!(report.flagged().count(), 1);
    }

    #[test]
    fn missing_rates_are_flagged() {
        let no_charge = role(0, None, Some(dec!(100)));
        let no_cost = role(1, Some(dec!(200)), None);
        let params = UpliftParams::new(UpliftKind::FlatAmount, dec!(50), "Jul.2025");
        let report = evaluate(&[&no_charge, &no_cost], &params).unwrap();
        assert_eq!(
            report.rows[0].margin_pct,
            Err(MarginIssue::MissingRateData("charge rate"))
        );
        assert_eq!(
            report.rows[1].margin_pct,
            Err(MarginIssue::MissingRateData("cost rate"))
        );
        assert_eq!(report.average_pct, None);
    }

    #[test]
    fn no_affected_rows_means_no_average() {
        let params = UpliftParams::new(UpliftKind::Percentage, dec!(5), "Jul.2025");
        let report = evaluate(&[], &params).unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.average_pct, None);
    }

    #[test]
    fn margin_stays_within_bounds_when_charge_exceeds_cost() {
        let cases = [
            (dec!(101), dec!(100)),
            (dec!(1000), dec!(1)),
            (dec!(550), dec!(400)),
        ];
        for (charge, cost) in cases {
            let pct = margin_pct(charge, cost).unwrap();
            assert!(pct > Decimal::ZERO && pct < dec!(100), "{charge}/{cost} -> {pct}");
        }
    }

    #[test]
    fn current_margin_uses_unmodified_rates() {
        assert_eq!(current_margin(Some(dec!(500)), Some(dec!(400))), Some(dec!(20)));
        assert_eq!(current_margin(None, Some(dec!(400))), None);
    }

    #[test]
    fn unrepresentable_rates_do_not_panic() {
        let huge = role(7, Some(Decimal::MAX), Some(dec!(100)));
        let params = UpliftParams::new(UpliftKind::FlatAmount, dec!(50), "Jul.2025");
        assert_eq!(
            evaluate(&[&huge], &params),
            Err(UpliftError::Overflow {
                quantity: "new charge rate",
                row_id: Some(7),
            })
        );
        // A tiny charge rate against a huge cost has no representable margin.
        assert_eq!(
            margin_pct(dec!(0.0000000001), Decimal::MAX),
            Err(MarginIssue::UndefinedMargin)
        );
    }
}
