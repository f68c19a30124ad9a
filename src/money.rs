//! Currency rounding and display.
//!
//! Amounts are rounded half away from zero ("round half up" for the
//! positive figures a payslip carries) to two fraction digits.  The
//! same rule feeds the words conversion of the net salary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

pub const CURRENCY_DP: u32 = 2;

/// Round to paise using the crate-wide rounding rule.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to a whole rupee using the same rule, as a `u64` magnitude.
pub fn whole_units(amount: Decimal) -> u64 {
    amount
        .abs()
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(u64::MAX)
}

/// `1234567.5` -> `"1,234,567.50"`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = round_currency(amount);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}

/// Day counts without trailing zeros: `19`, `19.5`.
pub fn format_days(days: Decimal) -> String {
    days.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_amount(dec!(22325)), "22,325.00");
        assert_eq!(format_amount(dec!(1234567.5)), "1,234,567.50");
        assert_eq!(format_amount(dec!(999.999)), "1,000.00");
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(12)), "12.00");
    }

    #[test]
    fn negative_amounts_keep_their_sign() {
        assert_eq!(format_amount(dec!(-4500.25)), "-4,500.25");
        assert_eq!(format_amount(dec!(-0.001)), "0.00");
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_currency(dec!(2.345)), dec!(2.35));
        assert_eq!(round_currency(dec!(2.355)), dec!(2.36));
        assert_eq!(whole_units(dec!(44512.50)), 44513);
        assert_eq!(whole_units(dec!(44511.49)), 44511);
    }

    #[test]
    fn day_counts_drop_trailing_zeros() {
        assert_eq!(format_days(dec!(19.00)), "19");
        assert_eq!(format_days(dec!(19.50)), "19.5");
    }
}
