//! Pay period resolution.
//!
//! Decides which months need a payslip for one employee: either just
//! the month containing `current`, or every month from the joining
//! month through the current one.

use crate::models::PayPeriod;
use chrono::NaiveDate;

/// Resolve the periods to generate, in ascending order.
///
/// Both dates are compared by month: a joining month after the month of
/// `current` yields no periods in either mode, while joining later in
/// the current month still yields that month.  Stepping works on
/// (year, month) pairs, so month lengths and year boundaries need no
/// special handling.
pub fn resolve(joining: NaiveDate, current: NaiveDate, all_past: bool) -> Vec<PayPeriod> {
    let first = PayPeriod::containing(joining);
    let last = PayPeriod::containing(current);
    if first > last {
        return Vec::new();
    }
    if !all_past {
        return vec![last];
    }
    let mut periods = Vec::new();
    let mut cursor = first;
    while cursor <= last {
        periods.push(cursor);
        cursor = cursor.next();
    }
    periods
}
