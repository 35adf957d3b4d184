//! Row-oriented payloads of the spreadsheet service and their translation
//! into attendance events.

use crate::errors::{AppError, AppResult};
use crate::models::{
    AttendanceEvent, AttendanceStatus, EventOrigin, EventSource, Student, StudentId,
};
use crate::utils::date::parse_date;
use crate::utils::time::{at, parse_time};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const ACTION_SUBMIT: &str = "submit";
pub const ACTION_GET_ALL: &str = "getAllAttendance";
pub const ACTION_GET_STUDENTS: &str = "getStudentList";
pub const ACTION_TEST: &str = "test";

/// `{success, data, error?, message?}` as answered by every readable action.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Envelope {
    pub fn parse(body: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Rows of a successful answer; a `success: false` answer is an error.
    pub fn into_rows(self) -> AppResult<Vec<Value>> {
        if !self.success {
            let reason = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "unspecified error".to_string());
            return Err(AppError::RemoteRejected(reason));
        }
        Ok(self.data.unwrap_or_default())
    }
}

/// One spreadsheet row: a student's day with up to two swipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRow {
    pub id: String,
    pub student_id: StudentId,
    pub student_name: String,
    pub date: NaiveDate,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
}

/// Spreadsheet cells arrive either as strings or as numbers.
fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `date` is either a plain day or a serialized date-time (Apps Script turns
/// Date cells into ISO strings); the latter is read in the school offset.
fn row_date(raw: &str, offset: &FixedOffset) -> Option<NaiveDate> {
    parse_date(raw).or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(offset).date_naive())
    })
}

impl RemoteRow {
    /// Decode one row. `None` for rows the service could not have meant as
    /// attendance (missing or malformed student id, unreadable date).
    pub fn from_value(value: &Value, offset: &FixedOffset) -> Option<Self> {
        let student_raw = scalar(value.get("studentId"))?;
        let student_id = match StudentId::parse(&student_raw) {
            Ok(id) => id,
            Err(_) => {
                debug!(student = %student_raw, "remote row dropped: malformed student id");
                return None;
            }
        };
        let date_raw = scalar(value.get("date"))?;
        let Some(date) = row_date(&date_raw, offset) else {
            debug!(date = %date_raw, "remote row dropped: unreadable date");
            return None;
        };

        Some(Self {
            id: scalar(value.get("id")).unwrap_or_else(|| format!("{date}-{student_id}")),
            student_id,
            student_name: scalar(value.get("studentName")).unwrap_or_default(),
            date,
            check_in_time: scalar(value.get("checkInTime")),
            check_out_time: scalar(value.get("checkOutTime")),
        })
    }

    /// Zero, one or two events. A swipe whose time does not parse is left out.
    pub fn expand(&self, offset: &FixedOffset) -> Vec<AttendanceEvent> {
        [
            (AttendanceStatus::CheckIn, &self.check_in_time),
            (AttendanceStatus::CheckOut, &self.check_out_time),
        ]
        .into_iter()
        .filter_map(|(status, time)| {
            let raw = time.as_deref()?;
            let Some(timestamp) = parse_time(raw).and_then(|t| at(offset, self.date, t)) else {
                debug!(row = %self.id, time = %raw, "remote swipe dropped: unreadable time");
                return None;
            };
            Some(AttendanceEvent {
                id: format!("{}-{}", self.id, status.id_suffix()),
                student_id: self.student_id.clone(),
                student_name: self.student_name.clone(),
                status,
                timestamp,
                submitted_at: None,
                source: EventSource::RemoteOnly,
                origin: EventOrigin::Recorded,
                synced_at: None,
            })
        })
        .collect()
    }
}

/// Expand all rows of a `getAllAttendance` answer.
pub fn expand_rows(rows: &[Value], offset: &FixedOffset) -> Vec<AttendanceEvent> {
    rows.iter()
        .filter_map(|v| RemoteRow::from_value(v, offset))
        .flat_map(|row| row.expand(offset))
        .collect()
}

/// Decode a `getStudentList` answer, skipping entries with a bad id.
pub fn parse_students(rows: &[Value]) -> Vec<Student> {
    rows.iter()
        .filter_map(|v| {
            let id = StudentId::parse(&scalar(v.get("studentId"))?).ok()?;
            Some(Student {
                student_id: id,
                student_name: scalar(v.get("studentName")).unwrap_or_default(),
            })
        })
        .collect()
}

/// Form fields of a `submit` request.
pub fn submit_form(event: &AttendanceEvent) -> Vec<(&'static str, String)> {
    vec![
        ("action", ACTION_SUBMIT.to_string()),
        ("student_id", event.student_id.to_string()),
        ("student_name", event.student_name.clone()),
        ("status", event.status.label().to_string()),
        ("timestamp", event.timestamp.to_rfc3339()),
        ("source", event.origin.wire_source().to_string()),
    ]
}
