//! Payslip computation engine.
//!
//! The `engine` module turns one [`EmployeeRecord`] and a [`PayPeriod`]
//! into a [`PayslipModel`].  Earnings and deductions are described by
//! static component tables so that the order on the page, the
//! proration treatment and the inclusion rule of every line item live
//! in one place.
//!
//! Each line item is rounded to paise before it is summed, which keeps
//! the printed totals equal to the sum of the printed items.

use crate::models::{
    Compensation, Deductions, EmployeeRecord, LineItem, PayPeriod, PayslipModel, SalaryDays,
};
use crate::money::{round_currency, whole_units};
use crate::proration::Treatment;
use crate::words::words;
use rust_decimal::Decimal;
use thiserror::Error;

/// The record holds figures too large to compute with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("{0} is too large to compute")]
    Overflow(&'static str),
}

/// When a component appears on the payslip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inclusion {
    Always,
    /// Only when the amount is strictly greater than zero.
    WhenPositive,
}

impl Inclusion {
    fn admits(self, amount: Decimal) -> bool {
        match self {
            Inclusion::Always => true,
            Inclusion::WhenPositive => amount > Decimal::ZERO,
        }
    }
}

struct EarningComponent {
    label: &'static str,
    treatment: Treatment,
    inclusion: Inclusion,
    amount: fn(&Compensation) -> Decimal,
}

struct DeductionComponent {
    label: &'static str,
    inclusion: Inclusion,
    amount: fn(&Deductions) -> Decimal,
}

const EARNINGS: &[EarningComponent] = &[
    EarningComponent {
        label: "Basic",
        treatment: Treatment::Prorated,
        inclusion: Inclusion::Always,
        amount: |c| c.basic,
    },
    EarningComponent {
        label: "HRA",
        treatment: Treatment::Prorated,
        inclusion: Inclusion::Always,
        amount: |c| c.hra,
    },
    EarningComponent {
        label: "Special Allowance",
        treatment: Treatment::Prorated,
        inclusion: Inclusion::Always,
        amount: |c| c.special_allowance,
    },
    EarningComponent {
        label: "Medical Allowance",
        treatment: Treatment::Fixed,
        inclusion: Inclusion::Always,
        amount: |c| c.medical_allowance,
    },
    EarningComponent {
        label: "Transport Allowance",
        treatment: Treatment::Fixed,
        inclusion: Inclusion::Always,
        amount: |c| c.transport_allowance,
    },
    EarningComponent {
        label: "Professional Allowance",
        treatment: Treatment::Fixed,
        inclusion: Inclusion::Always,
        amount: |c| c.professional_allowance,
    },
    EarningComponent {
        label: "Performance Pay",
        treatment: Treatment::Fixed,
        inclusion: Inclusion::Always,
        amount: |c| c.performance_pay,
    },
    EarningComponent {
        label: "Courier Reimbursement",
        treatment: Treatment::Fixed,
        inclusion: Inclusion::Always,
        amount: |c| c.courier_reimbursement,
    },
    EarningComponent {
        label: "Performance Bonus",
        treatment: Treatment::Fixed,
        inclusion: Inclusion::WhenPositive,
        amount: |c| c.performance_bonus,
    },
];

const DEDUCTIONS: &[DeductionComponent] = &[
    DeductionComponent {
        label: "Professional Tax",
        inclusion: Inclusion::Always,
        amount: |d| d.professional_tax,
    },
    DeductionComponent {
        label: "PF (Provident Fund)",
        inclusion: Inclusion::WhenPositive,
        amount: |d| d.pf,
    },
    DeductionComponent {
        label: "Performance Bonus Recovery",
        inclusion: Inclusion::WhenPositive,
        amount: |d| d.performance_bonus_recovery,
    },
];

/// Compose the payslip for `record` in `period`.
///
/// Bad cells were already replaced by zero during ingestion, and a zero
/// working-day count simply zeroes the prorated components.  The only
/// failure is an amount so large that the arithmetic overflows.
pub fn compose(
    record: &EmployeeRecord,
    period: PayPeriod,
) -> Result<PayslipModel, ComposeError> {
    let total_days = record.attendance.total_working_days;
    let payable_days = record.attendance.actual_payable_days;

    let mut earnings = Vec::with_capacity(EARNINGS.len());
    for component in EARNINGS {
        let full = (component.amount)(&record.compensation);
        let amount = component
            .treatment
            .apply(full, total_days, payable_days)
            .ok_or(ComposeError::Overflow(component.label))?;
        if component.inclusion.admits(amount) {
            earnings.push(LineItem::new(component.label, round_currency(amount)));
        }
    }

    let deductions: Vec<LineItem> = DEDUCTIONS
        .iter()
        .filter_map(|component| {
            let amount = (component.amount)(&record.deductions);
            component
                .inclusion
                .admits(amount)
                .then(|| LineItem::new(component.label, round_currency(amount)))
        })
        .collect();

    let total_earnings = total_of(&earnings).ok_or(ComposeError::Overflow("Total Earnings"))?;
    let total_deductions =
        total_of(&deductions).ok_or(ComposeError::Overflow("Total Deductions"))?;
    let net_salary = total_earnings
        .checked_sub(total_deductions)
        .ok_or(ComposeError::Overflow("Net Salary"))?;
    let loss_of_pay_days = total_days
        .checked_sub(payable_days)
        .ok_or(ComposeError::Overflow("Loss of Pay Days"))?;

    Ok(PayslipModel {
        period,
        days: SalaryDays {
            actual_payable_days: payable_days,
            total_working_days: total_days,
            loss_of_pay_days,
            days_payable: payable_days,
        },
        earnings,
        deductions,
        total_earnings,
        total_deductions,
        net_salary,
        net_salary_in_words: amount_in_words(net_salary),
    })
}

fn total_of(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.amount))
}

/// `"Forty Four Thousand ... only"`, spelled from the whole-rupee
/// rounding of `amount`.  Negative nets are prefixed with `"Minus"`.
pub fn amount_in_words(amount: Decimal) -> String {
    let spelled = words(whole_units(amount));
    if amount.is_sign_negative() && whole_units(amount) > 0 {
        format!("Minus {spelled} only")
    } else {
        format!("{spelled} only")
    }
}
