use super::{event::AttendanceEvent, student::StudentId};
use chrono::NaiveDate;
use serde::Serialize;

/// Classification of one student on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    /// Both a check-in and a check-out.
    Completed,
    /// Checked in, never checked out.
    Ongoing,
    /// No check-in at all.
    Missing,
}

/// Per-student view of a single day, recomputed on every query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDayStatus {
    pub student_id: StudentId,
    pub student_name: String,
    /// Earliest check-in of the day.
    pub check_in: Option<AttendanceEvent>,
    /// Latest check-out of the day.
    pub check_out: Option<AttendanceEvent>,
    pub records: Vec<AttendanceEvent>,
}

impl StudentDayStatus {
    pub fn state(&self) -> DayState {
        match (&self.check_in, &self.check_out) {
            (None, _) => DayState::Missing,
            (Some(_), None) => DayState::Ongoing,
            (Some(_), Some(_)) => DayState::Completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total: usize,
    pub completed: usize,
    pub ongoing: usize,
    pub missing: usize,
    pub completion_rate: u8,
    pub students: Vec<StudentDayStatus>,
}

/// One entry of the 7-day trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTrend {
    pub date: NaiveDate,
    /// Short label such as "Oct 19".
    pub label: String,
    pub total: usize,
    pub completed: usize,
    pub rate: u8,
}
