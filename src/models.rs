//! Data models for the Payslip Engine.
//!
//! The `models` module defines the strongly typed records that flow
//! through the engine: the employee row read from the data source, the
//! pay period being billed, and the render-ready payslip produced by
//! the composer.  They derive `Serialize` and `Deserialize` so the same
//! types back the HTTP API and the `preview` command.

use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder shown for any text field that is absent from the source.
pub const NOT_AVAILABLE: &str = "N/A";

/// One row of employee data.
///
/// Every field is declared explicitly; defaults are filled in once at
/// ingestion (see [`crate::ingest`]) and the record is immutable after
/// that.  Missing text becomes `"N/A"`, missing amounts become zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeRecord {
    /// Identifier printed on the payslip.  Required for processing.
    pub employee_id: String,
    /// Full name.  Required for processing; also names the output files.
    pub full_name: String,
    /// Destination for the notification.  `None` disables emailing.
    pub email: Option<String>,
    pub date_of_joining: JoiningDate,
    pub department: String,
    pub sub_department: String,
    pub designation: String,
    pub payment_mode: String,
    pub bank: String,
    pub bank_ifsc: String,
    pub bank_account: String,
    pub pan: String,
    pub uan: String,
    pub pf_number: String,
    pub compensation: Compensation,
    pub attendance: Attendance,
    pub deductions: Deductions,
}

impl Default for EmployeeRecord {
    fn default() -> Self {
        let na = || NOT_AVAILABLE.to_string();
        Self {
            employee_id: String::new(),
            full_name: String::new(),
            email: None,
            date_of_joining: JoiningDate::default(),
            department: na(),
            sub_department: na(),
            designation: na(),
            payment_mode: na(),
            bank: na(),
            bank_ifsc: na(),
            bank_account: na(),
            pan: na(),
            uan: na(),
            pf_number: na(),
            compensation: Compensation::default(),
            attendance: Attendance::default(),
            deductions: Deductions::default(),
        }
    }
}

impl EmployeeRecord {
    /// A record can only be turned into payslips when both the ID and
    /// the name are present.
    pub fn is_processable(&self) -> bool {
        !self.employee_id.trim().is_empty() && !self.full_name.trim().is_empty()
    }

    /// The email address to notify, if a usable one was provided.
    pub fn notification_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty() && *email != NOT_AVAILABLE)
    }
}

/// Monthly compensation components.  All amounts are full-period
/// figures; proration happens in the composer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compensation {
    pub annual_ctc: Decimal,
    pub basic: Decimal,
    pub hra: Decimal,
    pub medical_allowance: Decimal,
    pub transport_allowance: Decimal,
    pub special_allowance: Decimal,
    pub professional_allowance: Decimal,
    pub performance_pay: Decimal,
    pub courier_reimbursement: Decimal,
    pub performance_bonus: Decimal,
}

/// Attendance for the period being billed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attendance {
    pub total_working_days: Decimal,
    pub actual_payable_days: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deductions {
    pub professional_tax: Decimal,
    pub performance_bonus_recovery: Decimal,
    pub pf: Decimal,
}

/// The joining date as it appeared in the source, plus its parsed
/// value when one of the accepted formats matched.
///
/// Serialised as the raw text so API clients send the same strings the
/// spreadsheet contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct JoiningDate {
    raw: String,
    parsed: Option<NaiveDate>,
}

const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d", "%d %b %Y", "%d-%b-%Y"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

impl JoiningDate {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let parsed = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                DATE_TIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                    .map(|dt| dt.date())
            });
        Self {
            raw: raw.to_string(),
            parsed,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            raw: date.format("%d-%m-%Y").to_string(),
            parsed: Some(date),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.parsed
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `27 AUG 2025` when parsed, otherwise the raw text unchanged.
    pub fn display(&self) -> String {
        match self.parsed {
            Some(date) => date.format("%d %b %Y").to_string().to_uppercase(),
            None => self.raw.clone(),
        }
    }
}

impl Default for JoiningDate {
    fn default() -> Self {
        Self {
            raw: NOT_AVAILABLE.to_string(),
            parsed: None,
        }
    }
}

impl From<String> for JoiningDate {
    fn from(raw: String) -> Self {
        JoiningDate::parse(&raw)
    }
}

impl From<JoiningDate> for String {
    fn from(date: JoiningDate) -> Self {
        date.raw
    }
}

/// One billing cycle: a calendar month of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct PayPeriod {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPeriod> for PayPeriod {
    type Error = String;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        PayPeriod::new(raw.year, raw.month)
            .ok_or_else(|| format!("month must be between 1 and 12, got {}", raw.month))
    }
}

impl PayPeriod {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// English month name, e.g. `"November"`.
    pub fn month_name(&self) -> &'static str {
        Month::try_from(self.month as u8)
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }

    /// Key used by the idempotency log: `<year>-<Month>`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.year, self.month_name())
    }

    /// The following calendar month, rolling over the year boundary.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl std::fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

/// A labelled amount in the earnings or deductions column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Working-day figures shown in the salary-details row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryDays {
    pub actual_payable_days: Decimal,
    pub total_working_days: Decimal,
    pub loss_of_pay_days: Decimal,
    /// Informational only; equal to `actual_payable_days`.
    pub days_payable: Decimal,
}

/// The computed, render-ready payslip for one employee and period.
///
/// `total_earnings` and `total_deductions` are always the exact sums of
/// the listed line items, and `net_salary` their difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipModel {
    pub period: PayPeriod,
    pub days: SalaryDays,
    pub earnings: Vec<LineItem>,
    pub deductions: Vec<LineItem>,
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
    pub net_salary_in_words: String,
}
