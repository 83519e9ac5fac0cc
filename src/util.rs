// Utility helpers for parsing and display formatting.
//
// This module centralizes the "dirty" CSV number handling so the rest of the
// code can assume clean, typed decimals.
use num_format::{Locale, ToFormattedString};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a spreadsheet-exported amount into a `Decimal`.
///
/// - Trims whitespace.
/// - Strips a leading currency symbol and thousands separators (`$1,250.00`).
/// - Rejects anything containing letters (`n/a`, `TBC`).
/// - Returns `None` for blanks and anything else that cannot be parsed.
pub fn parse_decimal_safe(s: Option<&str>) -> Option<Decimal> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Sum that stops with `None` instead of panicking when it leaves the decimal
/// range.
pub fn checked_sum<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}


pub fn format_number(n: Decimal, decimals: usize) -> String {
    // Fixed decimal places plus `1,234,567.89` style separators.
    let neg = n.is_sign_negative() && !n.is_zero();
    let rounded = n
        .abs()
        .round_dp_with_strategy(decimals as u32, RoundingStrategy::MidpointAwayFromZero);
    let s = format!("{:.*}", decimals, rounded);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i128 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// Whole-dollar currency, e.g. `$12,500` or `-$300`.
pub fn format_currency(n: Decimal) -> String {
    let body = format_number(n, 0);
    match body.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", body),
    }
}

/// Daily rates keep their cents.
pub fn format_rate(n: Option<Decimal>) -> String {
    match n {
        Some(v) => format!("${}", format_number(v, 2)),
        None => "-".to_string(),
    }
}

/// Two-decimal percentage; an undefined value is shown as `n/a`, never `0.00%`.
pub fn format_percent(n: Option<Decimal>) -> String {
    match n {
        Some(v) => format!("{}%", format_number(v, 2)),
        None => "n/a".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
