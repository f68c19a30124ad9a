//! Idempotency log for completed runs.
//!
//! A small JSON file records the key of the last fully processed
//! period (`last_sent`) plus an append-only history of runs.  It is
//! written once, after every employee and period has been handled, so a
//! run that dies part-way leaves the period unmarked and the next run
//! reprocesses it.

use crate::models::PayPeriod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentLogError {
    #[error("sent log I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sent log is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub month: String,
    pub year: i32,
    pub timestamp: DateTime<Utc>,
    /// Identifiers (paths) of the documents produced by the run.
    pub created: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentLog {
    #[serde(default)]
    pub last_sent: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl SentLog {
    /// Load the log; a missing file is an empty log.
    pub fn load(path: &Path) -> Result<Self, SentLogError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn is_sent(&self, period: PayPeriod) -> bool {
        self.last_sent.as_deref() == Some(period.key().as_str())
    }

    /// Mark `period` as sent and append the run to the history.
    pub fn record_run(
        &mut self,
        period: PayPeriod,
        timestamp: DateTime<Utc>,
        created: Vec<String>,
    ) {
        self.last_sent = Some(period.key());
        self.history.push(HistoryEntry {
            month: period.month_name().to_string(),
            year: period.year(),
            timestamp,
            created,
        });
    }

    pub fn save(&self, path: &Path) -> Result<(), SentLogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
