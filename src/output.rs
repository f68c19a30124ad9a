//! Where payslip documents are written.
//!
//! Documents live under `<root>/<full name>/<year>/<Month>/` and are named
//! `<full name>-payslip-<Month>-<year>.pdf`.

use crate::models::PayPeriod;
use std::path::{Path, PathBuf};

/// Replace path separators so a name stays one path component.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

pub fn document_name(full_name: &str, period: PayPeriod) -> String {
    format!(
        "{}-payslip-{}-{}.pdf",
        sanitize_name(full_name),
        period.month_name(),
        period.year()
    )
}

pub fn document_dir(root: &Path, full_name: &str, period: PayPeriod) -> PathBuf {
    root.join(sanitize_name(full_name))
        .join(period.year().to_string())
        .join(period.month_name())
}

/// Write `bytes` to the document's location, creating directories as
/// needed.  An existing file for the same employee and period is
/// replaced.
pub fn write_document(
    root: &Path,
    full_name: &str,
    period: PayPeriod,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    let dir = document_dir(root, full_name, period);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(document_name(full_name, period));
    std::fs::write(&path, bytes)?;
    Ok(path)
}
