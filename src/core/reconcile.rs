//! Merge of remote and local event sets into one deduplicated stream.

use crate::models::{AttendanceEvent, AttendanceStatus, StudentId};
use crate::utils::time::truncate_to_minute;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Two events with the same key are the same real-world swipe. Computed on
/// the UTC instant so that different offset renderings still collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub date: NaiveDate,
    pub student_id: StudentId,
    pub status: AttendanceStatus,
    pub minute: NaiveTime,
}

impl DedupKey {
    pub fn of(ev: &AttendanceEvent) -> Self {
        let utc = ev.timestamp.with_timezone(&Utc);
        Self {
            date: utc.date_naive(),
            student_id: ev.student_id.clone(),
            status: ev.status,
            minute: truncate_to_minute(utc.time()),
        }
    }
}

/// Which sources contributed to a merged view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Provenance {
    /// The remote fetch succeeded (possibly with zero rows).
    Hybrid,
    /// The remote fetch failed; the view holds local data only.
    LocalFallback { reason: String },
}

impl Provenance {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Provenance::LocalFallback { .. })
    }
}

/// Remote events first, then local events whose key was not seen yet.
/// Result is most recent first; ties fall back to the id so the output does
/// not depend on input order.
pub fn merge(remote: &[AttendanceEvent], local: &[AttendanceEvent]) -> Vec<AttendanceEvent> {
    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(remote.len() + local.len());
    let mut merged = Vec::with_capacity(remote.len() + local.len());

    for ev in remote.iter().chain(local.iter()) {
        if seen.insert(DedupKey::of(ev)) {
            merged.push(ev.clone());
        }
    }

    merged.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
    merged
}
