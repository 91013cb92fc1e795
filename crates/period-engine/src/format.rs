//! Display formatting shared by range labels, tables and tooltips.
//!
//! Mirrors the en-US conventions the dashboard renders with: `Jun 15, 2024`,
//! `$1,234`, `1,234`, `12.5%`.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// `Jun 15, 2024`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `Jun 15`
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Whole US dollars with thousands separators, e.g. `$1,234` or `-$56`.
///
/// Halves round away from zero.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${}", group_thousands(&rounded.abs().trunc().to_string()))
}

/// An integer count with thousands separators, e.g. `12,345`.
pub fn format_count(value: i64) -> String {
    let digits = group_thousands(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{digits}")
    } else {
        digits
    }
}

/// A percentage with one decimal place, e.g. `12.5%`.
pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.1}%", rounded)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_long_date_has_no_leading_zero() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_long_date(date), "Jan 5, 2024");
    }

    #[test]
    fn test_short_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(format_short_date(date), "Dec 25");
    }

    #[test]
    fn test_currency_groups_and_rounds() {
        assert_eq!(format_currency(dec!(1234567.49)), "$1,234,567");
        assert_eq!(format_currency(dec!(999.5)), "$1,000");
        assert_eq!(format_currency(dec!(0)), "$0");
    }

    #[test]
    fn test_currency_negative() {
        assert_eq!(format_currency(dec!(-1500)), "-$1,500");
        assert_eq!(format_currency(dec!(-0.2)), "$0");
    }

    #[test]
    fn test_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(-123456), "-123,456");
    }

    #[test]
    fn test_percent_one_decimal() {
        assert_eq!(format_percent(dec!(12.345)), "12.3%");
        assert_eq!(format_percent(dec!(100)), "100.0%");
        assert_eq!(format_percent(dec!(0.05)), "0.1%");
    }
}
