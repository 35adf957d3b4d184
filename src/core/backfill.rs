//! Fixed administrative policy for days with a missing swipe.

use crate::models::{BackfillKind, BackfillRecord, DayState, StudentDayStatus};
use crate::utils::time::at;
use chrono::{FixedOffset, NaiveDate, NaiveTime};

/// Canonical check-in assigned to a student who never checked in.
pub fn canonical_check_in() -> NaiveTime {
    NaiveTime::from_hms_opt(7, 10, 0).unwrap_or_default()
}

/// Canonical check-out assigned to a student who never checked out.
pub fn canonical_check_out() -> NaiveTime {
    NaiveTime::from_hms_opt(7, 47, 0).unwrap_or_default()
}

/// One record per incomplete student: missing → synthetic check-in,
/// ongoing → synthetic check-out, completed → nothing. A missing student
/// reaches the check-out rule only on a later pass, once the synthetic
/// check-in has been committed.
pub fn detect_and_synthesize(
    date: NaiveDate,
    statuses: &[StudentDayStatus],
    offset: &FixedOffset,
) -> Vec<BackfillRecord> {
    statuses
        .iter()
        .filter_map(|s| {
            let (kind, time) = match s.state() {
                DayState::Completed => return None,
                DayState::Missing => (BackfillKind::MissingCheckIn, canonical_check_in()),
                DayState::Ongoing => (BackfillKind::MissingCheckOut, canonical_check_out()),
            };
            Some(BackfillRecord {
                student_id: s.student_id.clone(),
                student_name: s.student_name.clone(),
                date,
                kind,
                status: kind.status(),
                timestamp: at(offset, date, time)?,
            })
        })
        .collect()
}
