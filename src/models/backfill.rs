use super::{status::AttendanceStatus, student::StudentId};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

/// Which gap the policy filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillKind {
    MissingCheckIn,
    MissingCheckOut,
}

impl BackfillKind {
    /// Status of the swipe the policy synthesizes.
    pub fn status(&self) -> AttendanceStatus {
        match self {
            BackfillKind::MissingCheckIn => AttendanceStatus::CheckIn,
            BackfillKind::MissingCheckOut => AttendanceStatus::CheckOut,
        }
    }
}

/// A policy-generated swipe awaiting review. It is never a genuine event
/// until `commit_backfill` stores it with `EventOrigin::Policy`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillRecord {
    pub student_id: StudentId,
    pub student_name: String,
    pub date: NaiveDate,
    pub kind: BackfillKind,
    pub status: AttendanceStatus,
    pub timestamp: DateTime<FixedOffset>,
}
