//! Payslip Engine library crate.
//!
//! This crate exposes the payslip computation, the page layout and the
//! monthly batch run as reusable modules.  External applications may
//! depend on the `payslip_engine` crate and call `engine::compose` and
//! `layout::render` directly, drive a whole run via `batch::run`, or
//! embed the API via `api::build_router`.

pub mod words;
pub mod money;
pub mod proration;
pub mod models;
pub mod engine;
pub mod period;
pub mod fonts;
pub mod logo;
pub mod layout;
pub mod pdf;
pub mod ingest;
pub mod config;
pub mod sent_log;
pub mod mailer;
pub mod output;
pub mod batch;
pub mod api;
