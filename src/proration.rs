//! Day-based proration of pay components.
//!
//! Period-sensitive components (Basic, HRA, Special Allowance) are
//! scaled by `payable_days / total_working_days`.  Fixed allowances pass
//! through unchanged.

use rust_decimal::Decimal;

/// How a component reacts to the attendance figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    /// Scaled by payable days over working days.
    Prorated,
    /// Paid in full regardless of attendance.
    Fixed,
}

impl Treatment {
    /// `None` when the amount is too large to represent.
    pub fn apply(
        self,
        full_amount: Decimal,
        total_working_days: Decimal,
        payable_days: Decimal,
    ) -> Option<Decimal> {
        match self {
            Treatment::Prorated => prorate(full_amount, total_working_days, payable_days),
            Treatment::Fixed => Some(pass_through(full_amount)),
        }
    }
}

/// `full_amount * payable_days / total_working_days`, or zero when there
/// is no working-day data (`total_working_days <= 0`).  `None` when an
/// intermediate result overflows `Decimal`.
///
/// The result is not rounded; callers round once for display.
pub fn prorate(
    full_amount: Decimal,
    total_working_days: Decimal,
    payable_days: Decimal,
) -> Option<Decimal> {
    if total_working_days <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    full_amount
        .checked_mul(payable_days)?
        .checked_div(total_working_days)
}

pub fn pass_through(amount: Decimal) -> Decimal {
    amount
}
