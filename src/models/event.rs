use super::{source::EventOrigin, source::EventSource, status::AttendanceStatus, student::StudentId};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One check-in or check-out swipe. Immutable once stored: only the sync
/// bookkeeping fields (`source`, `synced_at`) change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEvent {
    pub id: String,                          // ⇔ attendance_events.id (ULID or "<row>-checkin")
    pub student_id: StudentId,               // ⇔ attendance_events.student_id
    pub student_name: String,                // ⇔ attendance_events.student_name
    pub status: AttendanceStatus,            // ⇔ attendance_events.status ('in' | 'out')
    pub timestamp: DateTime<FixedOffset>,    // ⇔ attendance_events.timestamp (RFC 3339)
    pub submitted_at: Option<DateTime<Utc>>, // ⇔ attendance_events.submitted_at
    pub source: EventSource,                 // ⇔ attendance_events.source
    #[serde(default)]
    pub origin: EventOrigin, // ⇔ attendance_events.origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>, // ⇔ attendance_events.synced_at
}

impl AttendanceEvent {
    /// Calendar day of the swipe as seen from the school's offset.
    pub fn date_in(&self, offset: &FixedOffset) -> NaiveDate {
        self.timestamp.with_timezone(offset).date_naive()
    }

    pub fn is_policy_generated(&self) -> bool {
        self.origin == EventOrigin::Policy
    }
}

/// An event as submitted, before the store assigns `id` and `submitted_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub student_id: StudentId,
    pub student_name: String,
    pub status: AttendanceStatus,
    pub timestamp: DateTime<FixedOffset>,
    pub origin: EventOrigin,
}

impl NewEvent {
    pub fn new(
        student_id: StudentId,
        student_name: impl Into<String>,
        status: AttendanceStatus,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            student_id,
            student_name: student_name.into(),
            status,
            timestamp,
            origin: EventOrigin::Recorded,
        }
    }

    pub fn with_origin(mut self, origin: EventOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// Optional day / student restriction for queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub date: Option<NaiveDate>,
    pub student_id: Option<StudentId>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            student_id: None,
        }
    }

    pub fn for_student(student_id: StudentId) -> Self {
        Self {
            date: None,
            student_id: Some(student_id),
        }
    }

    pub fn matches(&self, ev: &AttendanceEvent, offset: &FixedOffset) -> bool {
        if let Some(date) = self.date
            && ev.date_in(offset) != date
        {
            return false;
        }
        if let Some(id) = &self.student_id
            && &ev.student_id != id
        {
            return false;
        }
        true
    }
}

/// Raw submission as handed over by a UI collaborator. Validated into a
/// `NewEvent` before any I/O happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceInput {
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    pub status: String,
    /// RFC 3339; "now" when absent.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl AttendanceInput {
    pub fn validate(self, offset: &FixedOffset) -> AppResult<NewEvent> {
        let student_id = StudentId::parse(&self.student_id)?;
        let status = AttendanceStatus::parse(&self.status)
            .ok_or_else(|| AppError::InvalidStatus(self.status.clone()))?;
        let timestamp = match self.timestamp.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => DateTime::parse_from_rfc3339(raw)
                .map_err(|_| AppError::InvalidDate(raw.to_string()))?,
            _ => Utc::now().with_timezone(offset),
        };
        Ok(NewEvent::new(
            student_id,
            self.student_name.trim(),
            status,
            timestamp,
        ))
    }
}
