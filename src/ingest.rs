//! Employee data ingestion.
//!
//! Rows are read from a CSV export of the payroll spreadsheet.  Headers
//! are matched by name, so column order does not matter.  Every cell is
//! converted exactly once here, in [`record_from_row`]: missing text
//! becomes `"N/A"`, missing or unparseable amounts become zero and are
//! reported as [`CellIssue`]s for the caller to log.

use crate::models::{
    Attendance, Compensation, Deductions, EmployeeRecord, JoiningDate, NOT_AVAILABLE,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub const EMPLOYEE_ID: &str = "Employee ID";
pub const FULL_NAME: &str = "FullName";
pub const DATE_OF_JOINING: &str = "Date of Joining";
pub const DEPARTMENT: &str = "Department";
pub const SUB_DEPARTMENT: &str = "Sub Department";
pub const DESIGNATION: &str = "Designation";
pub const PAYMENT_MODE: &str = "Payment Mode";
pub const BANK: &str = "Bank";
pub const BANK_IFSC: &str = "Bank IFSC";
pub const BANK_ACCOUNT: &str = "Bank Account";
pub const PAN: &str = "PAN";
pub const UAN: &str = "UAN";
pub const PF_NUMBER: &str = "PF Number";
pub const EMAIL: &str = "Email";
pub const ANNUAL_CTC: &str = "Annual CTC";
pub const BASIC: &str = "Basic";
pub const HRA: &str = "HRA";
pub const MEDICAL_ALLOWANCE: &str = "Medical Allowance";
pub const TRANSPORT_ALLOWANCE: &str = "Transport Allowance";
pub const SPECIAL_ALLOWANCE: &str = "Special Allowance";
pub const PROFESSIONAL_ALLOWANCE: &str = "Professional Allowance";
pub const PERFORMANCE_PAY: &str = "Performance Pay";
pub const COURIER_REIMB: &str = "Courier Reimb";
pub const TOTAL_WORKING_DAYS: &str = "Total Working Days";
pub const ACTUAL_PAYABLE_DAYS: &str = "Actual Payable Days";
pub const PROFESSIONAL_TAX: &str = "Professional Tax";
pub const PERFORMANCE_BONUS: &str = "Performance Bonus";
pub const PERFORMANCE_BONUS_RECOVERY: &str = "Performance Bonus Recovery";
pub const PF: &str = "PF";

/// Column order of the generated template.
pub const TEMPLATE_COLUMNS: [&str; 29] = [
    EMPLOYEE_ID,
    FULL_NAME,
    DATE_OF_JOINING,
    DEPARTMENT,
    SUB_DEPARTMENT,
    DESIGNATION,
    PAYMENT_MODE,
    BANK,
    BANK_IFSC,
    BANK_ACCOUNT,
    PAN,
    UAN,
    PF_NUMBER,
    EMAIL,
    ANNUAL_CTC,
    BASIC,
    HRA,
    MEDICAL_ALLOWANCE,
    TRANSPORT_ALLOWANCE,
    SPECIAL_ALLOWANCE,
    PROFESSIONAL_ALLOWANCE,
    PERFORMANCE_PAY,
    COURIER_REIMB,
    TOTAL_WORKING_DAYS,
    ACTUAL_PAYABLE_DAYS,
    PROFESSIONAL_TAX,
    PERFORMANCE_BONUS,
    PERFORMANCE_BONUS_RECOVERY,
    PF,
];

const TEMPLATE_ROW: [&str; 29] = [
    "AA001",
    "Arun Kumar",
    "27-08-2025",
    "Design",
    "N/A",
    "Graphic Designer",
    "Bank Transfer",
    "ICICI Bank",
    "ICIC0000001",
    "9xx0100XXXXXXX",
    "XXXXKXXXXX",
    "N/A",
    "MOH/001/0001",
    "arun@arudra.com",
    "578400.00",
    "23500.00",
    "11750.00",
    "4700.00",
    "1600.00",
    "3100.00",
    "1175.00",
    "1175.00",
    "1200.00",
    "20",
    "19",
    "200.00",
    "1000.00",
    "0.0",
    "500.00",
];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read employee data from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("employee data has no {0:?} column")]
    MissingColumn(&'static str),
    #[error("failed to write template: {0}")]
    Template(#[from] csv::Error),
    #[error("failed to write template: {0}")]
    TemplateIo(#[from] std::io::Error),
}

/// A cell that could not be used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellIssue {
    pub column: &'static str,
    pub value: String,
    pub problem: &'static str,
}

impl std::fmt::Display for CellIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}: {}", self.column, self.value, self.problem)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Record {
        record: EmployeeRecord,
        issues: Vec<CellIssue>,
    },
    /// Employee ID or FullName was missing.
    Skipped,
}

/// One data row with its 1-based line number in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedRow {
    pub line: u64,
    pub outcome: RowOutcome,
}

/// Header-name lookup over one CSV row.
struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    /// The trimmed cell, or `None` when absent or blank.
    fn cell(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

struct Cells<'a> {
    row: Row<'a>,
    issues: Vec<CellIssue>,
}

impl Cells<'_> {
    fn text(&self, column: &'static str) -> String {
        self.row
            .cell(column)
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }

    fn amount(&mut self, column: &'static str) -> Decimal {
        let Some(value) = self.row.cell(column) else {
            return Decimal::ZERO;
        };
        match parse_amount(value) {
            Some(amount) => amount,
            None => {
                self.issues.push(CellIssue {
                    column,
                    value: value.to_string(),
                    problem: "not a number, using 0",
                });
                Decimal::ZERO
            }
        }
    }
}

/// Accepts `23500`, `23,500.00`, `1.5e3` and treats `N/A`/`nan` as absent.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.eq_ignore_ascii_case(NOT_AVAILABLE) || cleaned.eq_ignore_ascii_case("nan") {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

fn record_from_row(row: Row<'_>) -> RowOutcome {
    let (Some(employee_id), Some(full_name)) = (row.cell(EMPLOYEE_ID), row.cell(FULL_NAME)) else {
        return RowOutcome::Skipped;
    };
    let employee_id = employee_id.to_string();
    let full_name = full_name.to_string();
    let email = row.cell(EMAIL).map(str::to_string);

    let mut cells = Cells {
        row,
        issues: Vec::new(),
    };

    let date_of_joining = match cells
        .row
        .cell(DATE_OF_JOINING)
        .filter(|raw| !raw.eq_ignore_ascii_case(NOT_AVAILABLE))
    {
        Some(raw) => {
            let date = JoiningDate::parse(raw);
            if date.date().is_none() {
                cells.issues.push(CellIssue {
                    column: DATE_OF_JOINING,
                    value: raw.to_string(),
                    problem: "not a recognised date",
                });
            }
            date
        }
        None => JoiningDate::default(),
    };

    let record = EmployeeRecord {
        employee_id,
        full_name,
        email,
        date_of_joining,
        department: cells.text(DEPARTMENT),
        sub_department: cells.text(SUB_DEPARTMENT),
        designation: cells.text(DESIGNATION),
        payment_mode: cells.text(PAYMENT_MODE),
        bank: cells.text(BANK),
        bank_ifsc: cells.text(BANK_IFSC),
        bank_account: cells.text(BANK_ACCOUNT),
        pan: cells.text(PAN),
        uan: cells.text(UAN),
        pf_number: cells.text(PF_NUMBER),
        compensation: Compensation {
            annual_ctc: cells.amount(ANNUAL_CTC),
            basic: cells.amount(BASIC),
            hra: cells.amount(HRA),
            medical_allowance: cells.amount(MEDICAL_ALLOWANCE),
            transport_allowance: cells.amount(TRANSPORT_ALLOWANCE),
            special_allowance: cells.amount(SPECIAL_ALLOWANCE),
            professional_allowance: cells.amount(PROFESSIONAL_ALLOWANCE),
            performance_pay: cells.amount(PERFORMANCE_PAY),
            courier_reimbursement: cells.amount(COURIER_REIMB),
            performance_bonus: cells.amount(PERFORMANCE_BONUS),
        },
        attendance: Attendance {
            total_working_days: cells.amount(TOTAL_WORKING_DAYS),
            actual_payable_days: cells.amount(ACTUAL_PAYABLE_DAYS),
        },
        deductions: Deductions {
            professional_tax: cells.amount(PROFESSIONAL_TAX),
            performance_bonus_recovery: cells.amount(PERFORMANCE_BONUS_RECOVERY),
            pf: cells.amount(PF),
        },
    };

    RowOutcome::Record {
        record,
        issues: cells.issues,
    }
}

fn csv_reader<R: std::io::Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

fn collect_rows<R: std::io::Read>(
    reader: &mut csv::Reader<R>,
) -> Result<Vec<IngestedRow>, csv::Error> {
    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_string(), i))
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let row = Row {
            columns: &columns,
            record: &record,
        };
        rows.push(IngestedRow {
            line,
            outcome: record_from_row(row),
        });
    }
    Ok(rows)
}

/// Read all rows from any CSV source.
pub fn read_employees<R: std::io::Read>(source: R) -> Result<Vec<IngestedRow>, csv::Error> {
    collect_rows(&mut csv_reader(source))
}

/// Read the employee file.  Failing to open or parse it at all is fatal
/// for the run, as is a file without the two identity columns.
pub fn read_employee_file(path: &Path) -> Result<Vec<IngestedRow>, IngestError> {
    let read_error = |source| IngestError::Read {
        path: path.display().to_string(),
        source,
    };
    let file = std::fs::File::open(path).map_err(|e| read_error(csv::Error::from(e)))?;
    let mut reader = csv_reader(file);

    let headers = reader.headers().map_err(read_error)?;
    for required in [EMPLOYEE_ID, FULL_NAME] {
        if !headers.iter().any(|h| h.trim() == required) {
            return Err(IngestError::MissingColumn(required));
        }
    }

    collect_rows(&mut reader).map_err(read_error)
}

/// Write a one-row template with every recognised column.
pub fn write_template(path: &Path) -> Result<(), IngestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(TEMPLATE_COLUMNS)?;
    writer.write_record(TEMPLATE_ROW)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn only_record(rows: Vec<IngestedRow>) -> (EmployeeRecord, Vec<CellIssue>) {
        match rows.into_iter().next().map(|row| row.outcome) {
            Some(RowOutcome::Record { record, issues }) => (record, issues),
            other => panic!("expected a record, got {other:?}"),
        }
    }

    #[test]
    fn reads_template_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("employees.csv");
        write_template(&path).unwrap();

        let (record, issues) = only_record(read_employee_file(&path).unwrap());
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(record.employee_id, "AA001");
        assert_eq!(record.full_name, "Arun Kumar");
        assert_eq!(record.email.as_deref(), Some("arun@arudra.com"));
        assert_eq!(
            record.date_of_joining.date(),
            NaiveDate::from_ymd_opt(2025, 8, 27)
        );
        assert_eq!(record.compensation.basic, dec!(23500));
        assert_eq!(record.compensation.courier_reimbursement, dec!(1200));
        assert_eq!(record.attendance.actual_payable_days, dec!(19));
        assert_eq!(record.deductions.pf, dec!(500));
    }

    #[test]
    fn missing_cells_take_defaults() {
        let csv = "FullName,Employee ID,Basic\nPriya,AA002,\n";
        let (record, issues) = only_record(read_employees(csv.as_bytes()).unwrap());
        assert!(issues.is_empty());
        assert_eq!(record.department, NOT_AVAILABLE);
        assert_eq!(record.email, None);
        assert_eq!(record.compensation.basic, Decimal::ZERO);
        assert_eq!(record.date_of_joining.date(), None);
    }

    #[test]
    fn bad_cells_are_reported_not_fatal() {
        let csv = "Employee ID,FullName,Basic,HRA,Date of Joining\n\
                   AA003,Ravi,twelve,\"11,750.50\",someday\n";
        let (record, issues) = only_record(read_employees(csv.as_bytes()).unwrap());
        assert_eq!(record.compensation.basic, Decimal::ZERO);
        assert_eq!(record.compensation.hra, dec!(11750.50));
        let columns: Vec<_> = issues.iter().map(|issue| issue.column).collect();
        assert_eq!(columns, vec![DATE_OF_JOINING, BASIC]);
    }

    #[test]
    fn rows_without_identity_are_skipped() {
        let csv = "Employee ID,FullName\n,Nameless\nAA004,\nAA005,Meera\n";
        let rows = read_employees(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].outcome, RowOutcome::Skipped);
        assert_eq!(rows[1].outcome, RowOutcome::Skipped);
        assert!(matches!(rows[2].outcome, RowOutcome::Record { .. }));
        assert_eq!(rows[2].line, 4);
    }

    #[test]
    fn file_without_identity_columns_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("employees.csv");
        std::fs::write(&path, "Name,Salary\nX,1\n").unwrap();
        assert!(matches!(
            read_employee_file(&path),
            Err(IngestError::MissingColumn(EMPLOYEE_ID))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_employee_file(&dir.path().join("absent.csv")),
            Err(IngestError::Read { .. })
        ));
    }

    #[test]
    fn oversized_amount_is_read_and_refused_at_compose() {
        let csv = format!(
            "{EMPLOYEE_ID},{FULL_NAME},{BASIC},{TOTAL_WORKING_DAYS},{ACTUAL_PAYABLE_DAYS}\n\
             AA006,Kavya,1e28,30,30\n"
        );
        let (record, issues) = only_record(read_employees(csv.as_bytes()).unwrap());
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(record.compensation.basic, Decimal::from_scientific("1e28").unwrap());

        let period = crate::models::PayPeriod::new(2025, 11).unwrap();
        assert_eq!(
            crate::engine::compose(&record, period),
            Err(crate::engine::ComposeError::Overflow("Basic"))
        );
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount("23,500.00"), Some(dec!(23500)));
        assert_eq!(parse_amount(" 19 "), Some(dec!(19)));
        assert_eq!(parse_amount("1.5e3"), Some(dec!(1500)));
        assert_eq!(parse_amount("N/A"), Some(Decimal::ZERO));
        assert_eq!(parse_amount("abc"), None);
    }
}
