//! Per-student day status and completion rollups.

use crate::models::{
    AttendanceEvent, AttendanceStatus, DailyStats, DayState, DayTrend, Student, StudentDayStatus,
    StudentId,
};
use crate::utils::date::{short_label, trailing_days};
use chrono::{FixedOffset, NaiveDate};
use std::collections::BTreeMap;

/// Days covered by the weekly trend.
pub const TREND_DAYS: u32 = 7;

/// `round(completed / total * 100)`, 0 for an empty day.
pub fn completion_rate(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}

fn empty_status(student_id: StudentId, student_name: String) -> StudentDayStatus {
    StudentDayStatus {
        student_id,
        student_name,
        check_in: None,
        check_out: None,
        records: Vec::new(),
    }
}

fn fold_event(status: &mut StudentDayStatus, ev: &AttendanceEvent) {
    if status.student_name.is_empty() {
        status.student_name = ev.student_name.clone();
    }
    status.records.push(ev.clone());

    match ev.status {
        AttendanceStatus::CheckIn => {
            if status
                .check_in
                .as_ref()
                .is_none_or(|current| ev.timestamp < current.timestamp)
            {
                status.check_in = Some(ev.clone());
            }
        }
        AttendanceStatus::CheckOut => {
            if status
                .check_out
                .as_ref()
                .is_none_or(|current| ev.timestamp > current.timestamp)
            {
                status.check_out = Some(ev.clone());
            }
        }
    }
}

/// Group one day's events by student, ordered by student id. Each student's
/// `records` are chronological.
pub fn day_status(events: &[AttendanceEvent]) -> Vec<StudentDayStatus> {
    day_status_with_roster(events, &[])
}

/// Like `day_status`, but roster students without any event show up as
/// missing.
pub fn day_status_with_roster(
    events: &[AttendanceEvent],
    roster: &[Student],
) -> Vec<StudentDayStatus> {
    let mut groups: BTreeMap<StudentId, StudentDayStatus> = BTreeMap::new();

    let mut chronological: Vec<&AttendanceEvent> = events.iter().collect();
    chronological.sort_by_key(|ev| ev.timestamp);

    for ev in chronological {
        let entry = groups
            .entry(ev.student_id.clone())
            .or_insert_with(|| empty_status(ev.student_id.clone(), ev.student_name.clone()));
        fold_event(entry, ev);
    }

    for student in roster {
        groups
            .entry(student.student_id.clone())
            .or_insert_with(|| {
                empty_status(student.student_id.clone(), student.student_name.clone())
            });
    }

    groups.into_values().collect()
}

/// Reduce day statuses to counts and a completion rate.
pub fn daily_stats(date: NaiveDate, students: Vec<StudentDayStatus>) -> DailyStats {
    let count = |state: DayState| students.iter().filter(|s| s.state() == state).count();
    let completed = count(DayState::Completed);
    let ongoing = count(DayState::Ongoing);
    let missing = count(DayState::Missing);
    let total = students.len();

    DailyStats {
        date,
        total,
        completed,
        ongoing,
        missing,
        completion_rate: completion_rate(completed, total),
        students,
    }
}

/// Trailing `TREND_DAYS` days ending at `today`, oldest first. `events` may
/// span any range; each day only sees its own events.
pub fn weekly_stats(
    today: NaiveDate,
    events: &[AttendanceEvent],
    offset: &FixedOffset,
) -> Vec<DayTrend> {
    trailing_days(today, TREND_DAYS)
        .into_iter()
        .map(|date| {
            let day_events: Vec<AttendanceEvent> = events
                .iter()
                .filter(|ev| ev.date_in(offset) == date)
                .cloned()
                .collect();
            let stats = daily_stats(date, day_status(&day_events));
            DayTrend {
                date,
                label: short_label(date),
                total: stats.total,
                completed: stats.completed,
                rate: stats.completion_rate,
            }
        })
        .collect()
}
