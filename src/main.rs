//! Entry point for the payslip engine binary.
//!
//! `run` performs the monthly batch: it reads the employee file, writes
//! one PDF per employee and period and emails them.  `preview` prints the
//! computed payslip for one employee as JSON without writing anything,
//! and `serve` exposes the engine over HTTP.  All options come from
//! `PAYSLIP_*` environment variables (or a `.env` file); the flags here
//! only override the few that make sense per invocation.

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use payslip_engine::api::{self, AppState};
use payslip_engine::batch::{self, load_or_create_logo, RunOptions};
use payslip_engine::config::Settings;
use payslip_engine::engine::compose;
use payslip_engine::ingest::{read_employee_file, RowOutcome};
use payslip_engine::mailer::{Mailer, SmtpMailer};
use payslip_engine::models::PayPeriod;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "payslip", version, about = "Monthly payslip generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate and send payslips for the current month.
    Run {
        /// Generate every month since each employee joined.
        #[arg(long)]
        all_past: bool,
        /// Write the PDFs but send no email and leave the sent log alone.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the computed payslip for one employee as JSON.
    Preview {
        /// Employee ID as it appears in the employee file.
        employee_id: String,
        /// Month number (1-12); defaults to the current month.
        #[arg(long)]
        month: Option<u32>,
        /// Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,
    },
    /// Serve the HTTP API on PAYSLIP_BIND_ADDR.
    Serve,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = real_main() {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().context("failed to load configuration")?;

    match cli.command {
        Command::Run { all_past, dry_run } => run(&settings, all_past, dry_run),
        Command::Preview {
            employee_id,
            month,
            year,
        } => preview(&settings, &employee_id, month, year),
        Command::Serve => serve(&settings),
    }
}

fn run(settings: &Settings, all_past: bool, dry_run: bool) -> Result<()> {
    let mailer = match settings.smtp() {
        Some(smtp) if !dry_run => {
            Some(SmtpMailer::new(&smtp).context("invalid SMTP configuration")?)
        }
        _ => None,
    };
    let options = RunOptions {
        all_past: all_past || settings.send_all_past,
        dry_run,
    };
    let today = Local::now().date_naive();
    let mailer = mailer.as_ref().map(|m| m as &dyn Mailer);
    let report = batch::run(settings, today, mailer, options)?;

    if report.already_sent {
        println!("Payslips for {} were already sent.", report.period);
        return Ok(());
    }
    println!(
        "{}: {} payslip(s) written, {} emailed, {} row(s) skipped, {} failure(s).",
        report.period,
        report.produced.len(),
        report.notified,
        report.skipped_rows,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  {} {}: {}", failure.employee_id, failure.period, failure.reason);
    }
    Ok(())
}

fn preview(
    settings: &Settings,
    employee_id: &str,
    month: Option<u32>,
    year: Option<i32>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let period = PayPeriod::new(year.unwrap_or(today.year()), month.unwrap_or(today.month()))
        .context("month must be between 1 and 12")?;

    let rows = read_employee_file(&settings.employees_file)
        .with_context(|| format!("failed to read {}", settings.employees_file.display()))?;
    let record = rows.into_iter().find_map(|row| match row.outcome {
        RowOutcome::Record { record, .. } if record.employee_id == employee_id => Some(record),
        _ => None,
    });
    let Some(record) = record else {
        bail!("no employee with ID {employee_id:?} in {}", settings.employees_file.display());
    };

    let model = compose(&record, period)?;
    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}

fn serve(settings: &Settings) -> Result<()> {
    let state = AppState {
        company: settings.company_profile()?,
        logo: load_or_create_logo(&settings.logo_file),
    };
    let runtime =
        tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    info!(addr = %settings.bind_addr, "starting HTTP API");
    runtime.block_on(api::serve(&settings.bind_addr, state))
}
