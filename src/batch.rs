//! The monthly batch run.
//!
//! Reads the employee source, produces one PDF per employee and period,
//! emails it when possible and finally marks the current period as
//! sent.  Everything here runs sequentially; a failure for one employee
//! and period is logged and the loop moves on, while problems with the
//! configuration or the employee source abort the run before any
//! document is written.

use crate::config::Settings;
use crate::engine::compose;
use crate::ingest::{read_employee_file, write_template, RowOutcome};
use crate::layout::{self, CompanyProfile};
use crate::logo::{Logo, DEFAULT_LOGO_SVG};
use crate::mailer::{Mailer, Notification, PdfAttachment};
use crate::models::{EmployeeRecord, PayPeriod};
use crate::output::{document_name, write_document};
use crate::pdf::render_pdf;
use crate::period;
use crate::sent_log::SentLog;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Produce every period since joining, not just the current one.
    pub all_past: bool,
    /// Write documents but send no email and leave the sent log alone.
    pub dry_run: bool,
}

/// One (employee, period) pair that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub employee_id: String,
    pub period: PayPeriod,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub period: PayPeriod,
    /// The period was already marked as sent; nothing was produced.
    pub already_sent: bool,
    pub produced: Vec<PathBuf>,
    pub skipped_rows: usize,
    pub failures: Vec<Failure>,
    pub notified: usize,
}

impl RunReport {
    fn new(period: PayPeriod) -> Self {
        Self {
            period,
            already_sent: false,
            produced: Vec::new(),
            skipped_rows: 0,
            failures: Vec::new(),
            notified: 0,
        }
    }
}

/// Shared inputs for every document of a run.
struct RunContext<'a> {
    settings: &'a Settings,
    company: CompanyProfile,
    logo: Option<String>,
    mailer: Option<&'a dyn Mailer>,
    options: RunOptions,
}

/// Read the logo file, writing the default one first when it is
/// missing.  A logo that cannot be read or parsed is dropped with a
/// warning; payslips are still produced without it.
pub fn load_or_create_logo(path: &Path) -> Option<String> {
    if !path.exists() {
        match std::fs::write(path, DEFAULT_LOGO_SVG) {
            Ok(()) => info!(path = %path.display(), "created default logo"),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not create default logo");
                return Some(DEFAULT_LOGO_SVG.to_string());
            }
        }
    }
    let svg = match std::fs::read_to_string(path) {
        Ok(svg) => svg,
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "could not read logo, continuing without it"
            );
            return None;
        }
    };
    match Logo::parse(&svg) {
        Ok(_) => Some(svg),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unusable logo, continuing without it");
            None
        }
    }
}

/// Run the batch for the period containing `today`.
pub fn run(
    settings: &Settings,
    today: NaiveDate,
    mailer: Option<&dyn Mailer>,
    options: RunOptions,
) -> Result<RunReport> {
    let current = PayPeriod::containing(today);
    let mut report = RunReport::new(current);

    let company = settings
        .company_profile()
        .context("invalid company configuration")?;
    let mut sent_log = SentLog::load(&settings.sent_log)
        .with_context(|| format!("failed to load {}", settings.sent_log.display()))?;
    if sent_log.is_sent(current) {
        info!(period = %current, "payslips already sent for this period");
        report.already_sent = true;
        return Ok(report);
    }

    if !settings.employees_file.exists() {
        write_template(&settings.employees_file).with_context(|| {
            format!("failed to create {}", settings.employees_file.display())
        })?;
        info!(path = %settings.employees_file.display(), "created employee template");
    }
    let rows = read_employee_file(&settings.employees_file)
        .with_context(|| format!("failed to read {}", settings.employees_file.display()))?;

    let ctx = RunContext {
        settings,
        company,
        logo: load_or_create_logo(&settings.logo_file),
        mailer,
        options,
    };
    if mailer.is_none() && !options.dry_run {
        info!("SMTP is not configured, payslips will not be emailed");
    }

    for row in rows {
        let (record, issues) = match row.outcome {
            RowOutcome::Record { record, issues } => (record, issues),
            RowOutcome::Skipped => {
                warn!(line = row.line, "skipping row without Employee ID or FullName");
                report.skipped_rows += 1;
                continue;
            }
        };
        for issue in &issues {
            warn!(employee = %record.employee_id, line = row.line, "{issue}");
        }

        let joining = record.date_of_joining.date().unwrap_or_else(|| {
            warn!(
                employee = %record.employee_id,
                value = record.date_of_joining.raw(),
                "no usable joining date, assuming today"
            );
            today
        });
        let periods = period::resolve(joining, today, options.all_past);
        if periods.is_empty() {
            debug!(employee = %record.employee_id, %joining, "joined after the current month");
        }

        for period in periods {
            match produce(&ctx, &record, period) {
                Ok((path, bytes)) => {
                    info!(
                        employee = %record.employee_id,
                        %period,
                        path = %path.display(),
                        "payslip written"
                    );
                    if notify(&ctx, &record, period, &path, bytes) {
                        report.notified += 1;
                    }
                    report.produced.push(path);
                }
                Err(err) => {
                    let reason = format!("{err:#}");
                    error!(
                        employee = %record.employee_id,
                        %period,
                        error = %reason,
                        "payslip failed"
                    );
                    report.failures.push(Failure {
                        employee_id: record.employee_id.clone(),
                        period,
                        reason,
                    });
                }
            }
        }
    }

    if options.dry_run {
        info!(
            period = %current,
            produced = report.produced.len(),
            "dry run complete, sent log untouched"
        );
        return Ok(report);
    }

    let created = report
        .produced
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    sent_log.record_run(current, Utc::now(), created);
    sent_log
        .save(&settings.sent_log)
        .with_context(|| format!("failed to write {}", settings.sent_log.display()))?;
    info!(
        period = %current,
        produced = report.produced.len(),
        notified = report.notified,
        failures = report.failures.len(),
        "run complete"
    );
    Ok(report)
}

fn produce(
    ctx: &RunContext<'_>,
    record: &EmployeeRecord,
    period: PayPeriod,
) -> Result<(PathBuf, Vec<u8>)> {
    let model = compose(record, period)?;
    let page = layout::render(&model, record, &ctx.company, ctx.logo.as_deref());
    for warning in &page.warnings {
        warn!(employee = %record.employee_id, %period, "{warning}");
    }
    let title = format!("Payslip {} {}", record.full_name, period);
    let bytes = render_pdf(&page, &title).context("failed to render PDF")?;
    let path = write_document(&ctx.settings.output_dir, &record.full_name, period, &bytes)
        .context("failed to write PDF")?;
    Ok((path, bytes))
}

/// Email one document.  Returns whether a message was handed to the
/// mailer successfully.
fn notify(
    ctx: &RunContext<'_>,
    record: &EmployeeRecord,
    period: PayPeriod,
    path: &Path,
    bytes: Vec<u8>,
) -> bool {
    if ctx.options.dry_run {
        return false;
    }
    let Some(to) = record.notification_address() else {
        warn!(employee = %record.employee_id, "no email address, not sending");
        return false;
    };
    let Some(mailer) = ctx.mailer else {
        info!(employee = %record.employee_id, %period, "email skipped, SMTP not configured");
        return false;
    };
    let sender = ctx
        .settings
        .smtp()
        .map(|smtp| smtp.from_name)
        .unwrap_or_else(|| ctx.company.name.clone());
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| document_name(&record.full_name, period));
    let notification = Notification::payslip(
        to,
        &record.full_name,
        period,
        &ctx.company.name,
        &sender,
        PdfAttachment { filename, bytes },
    );
    match mailer.send(&notification) {
        Ok(()) => {
            info!(employee = %record.employee_id, %period, to, "email sent");
            true
        }
        Err(err) => {
            error!(employee = %record.employee_id, %period, to, error = %err, "email failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::TEMPLATE_COLUMNS;
    use crate::mailer::MailError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingMailer {
        sent: RefCell<Vec<Notification>>,
        fail_for: Option<String>,
    }

    impl Mailer for RecordingMailer {
        fn send(&self, notification: &Notification) -> Result<(), MailError> {
            if self.fail_for.as_deref() == Some(notification.to.as_str()) {
                return Err(MailError::Address {
                    address: notification.to.clone(),
                    reason: "rejected".into(),
                });
            }
            self.sent.borrow_mut().push(notification.clone());
            Ok(())
        }
    }

    fn settings_in(dir: &Path) -> Settings {
        Settings {
            employees_file: dir.join("employees.csv"),
            output_dir: dir.join("payslips"),
            sent_log: dir.join(".payslip_sent_log.json"),
            logo_file: dir.join("logo.svg"),
            ..Settings::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Writes a CSV with the full header and the given rows, each row
    /// being (id, name, joining, email, basic).
    fn write_employees(path: &Path, rows: &[(&str, &str, &str, &str, &str)]) {
        let mut writer = csv::Writer::from_path(path).unwrap();
        writer.write_record(TEMPLATE_COLUMNS).unwrap();
        for (id, name, joining, email, basic) in rows {
            let mut record = vec![String::new(); TEMPLATE_COLUMNS.len()];
            record[0] = id.to_string();
            record[1] = name.to_string();
            record[2] = joining.to_string();
            record[13] = email.to_string();
            record[15] = basic.to_string();
            record[23] = "30".to_string();
            record[24] = "30".to_string();
            writer.write_record(&record).unwrap();
        }
        writer.flush().unwrap();
    }

    #[test]
    fn first_run_creates_template_and_produces_the_sample() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let mailer = RecordingMailer::default();

        let report =
            run(&settings, date(2025, 11, 15), Some(&mailer), RunOptions::default()).unwrap();

        assert!(settings.employees_file.exists());
        assert!(settings.logo_file.exists());
        assert_eq!(report.produced.len(), 1);
        assert!(report.produced[0]
            .ends_with("Arun Kumar/2025/November/Arun Kumar-payslip-November-2025.pdf"));
        assert!(std::fs::read(&report.produced[0]).unwrap().starts_with(b"%PDF"));

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "arun@arudra.com");
        assert_eq!(sent[0].subject, "Payslip For November 2025 - Arun Arudra");
        assert_eq!(report.notified, 1);
    }

    #[test]
    fn second_run_in_the_same_month_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let mailer = RecordingMailer::default();
        let today = date(2025, 11, 15);

        run(&settings, today, Some(&mailer), RunOptions::default()).unwrap();
        let again = run(&settings, today, Some(&mailer), RunOptions::default()).unwrap();

        assert!(again.already_sent);
        assert!(again.produced.is_empty());
        assert_eq!(mailer.sent.borrow().len(), 1);

        let log = SentLog::load(&settings.sent_log).unwrap();
        assert_eq!(log.last_sent.as_deref(), Some("2025-November"));
        assert_eq!(log.history.len(), 1);
        assert_eq!(log.history[0].created.len(), 1);

        let next_month =
            run(&settings, date(2025, 12, 1), Some(&mailer), RunOptions::default()).unwrap();
        assert!(!next_month.already_sent);
        assert_eq!(next_month.produced.len(), 1);
    }

    #[test]
    fn bad_rows_do_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        write_employees(
            &settings.employees_file,
            &[
                ("E1", "Asha Rao", "01-10-2025", "asha@example.com", "30000"),
                ("", "No Id", "01-10-2025", "x@example.com", "1000"),
                ("E3", "Bala Iyer", "01-10-2025", "", "lots"),
                ("E4", "Chitra Nair", "01-10-2025", "chitra@example.com", "20000"),
            ],
        );
        let mailer = RecordingMailer {
            fail_for: Some("chitra@example.com".into()),
            ..RecordingMailer::default()
        };

        let report =
            run(&settings, date(2025, 11, 3), Some(&mailer), RunOptions::default()).unwrap();

        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.produced.len(), 3);
        assert!(report.failures.is_empty());
        // Bala has no address and Chitra's delivery fails.
        assert_eq!(report.notified, 1);
        assert_eq!(mailer.sent.borrow()[0].to, "asha@example.com");
        assert!(SentLog::load(&settings.sent_log).unwrap().is_sent(report.period));
    }

    #[test]
    fn all_past_covers_every_month_since_joining() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        write_employees(
            &settings.employees_file,
            &[
                ("E1", "Asha Rao", "20-11-2024", "", "30000"),
                ("E2", "Future Hire", "01-01-2026", "", "30000"),
            ],
        );
        let options = RunOptions {
            all_past: true,
            ..RunOptions::default()
        };

        let report = run(&settings, date(2025, 2, 10), None, options).unwrap();

        let names: Vec<String> = report
            .produced
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "Asha Rao-payslip-November-2024.pdf",
                "Asha Rao-payslip-December-2024.pdf",
                "Asha Rao-payslip-January-2025.pdf",
                "Asha Rao-payslip-February-2025.pdf",
            ]
        );
    }

    #[test]
    fn oversized_amount_fails_only_its_own_payslip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        write_employees(
            &settings.employees_file,
            &[
                ("E1", "Asha Rao", "01-10-2025", "", "30000"),
                ("E2", "Huge Pay", "01-10-2025", "", "79228162514264337593543950335"),
            ],
        );

        let report = run(&settings, date(2025, 11, 3), None, RunOptions::default()).unwrap();

        assert_eq!(report.produced.len(), 1);
        assert!(report.produced[0].ends_with("Asha Rao-payslip-November-2025.pdf"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].employee_id, "E2");
        assert!(report.failures[0].reason.contains("too large"));
        assert!(!settings.output_dir.join("Huge Pay").exists());
        assert!(SentLog::load(&settings.sent_log).unwrap().is_sent(report.period));
    }

    #[test]
    fn joining_later_this_month_still_gets_a_payslip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        write_employees(&settings.employees_file, &[("E1", "Asha Rao", "20-11-2025", "", "30000")]);

        let report = run(&settings, date(2025, 11, 3), None, RunOptions::default()).unwrap();

        assert_eq!(report.produced.len(), 1);
        assert!(report.produced[0].ends_with("Asha Rao-payslip-November-2025.pdf"));
    }

    #[test]
    fn unparseable_joining_date_means_current_month_only() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        write_employees(&settings.employees_file, &[("E1", "Asha Rao", "someday", "", "30000")]);
        let options = RunOptions {
            all_past: true,
            ..RunOptions::default()
        };

        let report = run(&settings, date(2025, 11, 3), None, options).unwrap();
        assert_eq!(report.produced.len(), 1);
        assert!(report.produced[0].ends_with("Asha Rao-payslip-November-2025.pdf"));
    }

    #[test]
    fn dry_run_sends_nothing_and_leaves_the_log_alone() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let mailer = RecordingMailer::default();
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };

        let report = run(&settings, date(2025, 11, 15), Some(&mailer), options).unwrap();

        assert_eq!(report.produced.len(), 1);
        assert_eq!(report.notified, 0);
        assert!(mailer.sent.borrow().is_empty());
        assert!(!settings.sent_log.exists());
    }

    #[test]
    fn invalid_brand_color_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            brand_color: "blue".into(),
            ..settings_in(dir.path())
        };
        assert!(run(&settings, date(2025, 11, 15), None, RunOptions::default()).is_err());
        assert!(!settings.output_dir.exists());
        assert!(!settings.sent_log.exists());
    }

    #[test]
    fn unreadable_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        std::fs::write(&settings.employees_file, "Name,Salary\nA,1\n").unwrap();
        let err = run(&settings, date(2025, 11, 15), None, RunOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Employee ID"));
        assert!(!settings.sent_log.exists());
    }

    #[test]
    fn broken_logo_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.svg");
        std::fs::write(&path, "<svg><circle r=\"3\"/></svg>").unwrap();
        assert_eq!(load_or_create_logo(&path), None);

        let fresh = dir.path().join("fresh.svg");
        assert_eq!(load_or_create_logo(&fresh).as_deref(), Some(DEFAULT_LOGO_SVG));
    }
}
