// src/export/mod.rs

mod csv_export;
mod json_export;

pub use csv_export::{CSV_HEADERS, render_csv};
pub use json_export::render_json;

use crate::errors::{AppError, AppResult};
use crate::models::AttendanceEvent;
use crate::utils::path::dated_file;
use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Serialize `events` and write `<dir>/<prefix>_<today>.<ext>`.
/// An empty event set is rejected before touching the filesystem.
pub fn export_events(
    events: &[AttendanceEvent],
    format: ExportFormat,
    dir: &Path,
    prefix: &str,
    today: NaiveDate,
    offset: &FixedOffset,
) -> AppResult<PathBuf> {
    if events.is_empty() {
        return Err(AppError::NothingToExport);
    }

    let bytes = match format {
        ExportFormat::Csv => render_csv(events, offset)?,
        ExportFormat::Json => render_json(events)?.into_bytes(),
    };

    fs::create_dir_all(dir)?;
    let path = dated_file(dir, prefix, today, format.as_str());
    fs::write(&path, bytes)?;

    info!(path = %path.display(), records = events.len(), "{} export completed", format.as_str());
    Ok(path)
}
