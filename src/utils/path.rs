//! Path utilities: expand ~ in configured paths, build export file names.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(path.trim_start_matches("~/"));
    }
    PathBuf::from(path)
}

/// `<dir>/<prefix>_<YYYY-MM-DD>.<ext>`
pub fn dated_file(dir: &Path, prefix: &str, date: NaiveDate, ext: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", prefix, date.format("%Y-%m-%d"), ext))
}
