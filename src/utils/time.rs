//! Time utilities: offsets, canonical policy times, minute truncation.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike};

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .ok()
}

/// Parse "+09:00" / "-03:30" / "Z".
pub fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    let probe = if s.eq_ignore_ascii_case("z") {
        "2000-01-01T00:00:00Z".to_string()
    } else {
        format!("2000-01-01T00:00:00{s}")
    };
    DateTime::parse_from_rfc3339(&probe).ok().map(|dt| *dt.offset())
}

/// Combine a calendar day and a wall-clock time in the given offset.
pub fn at(offset: &FixedOffset, date: NaiveDate, time: NaiveTime) -> Option<DateTime<FixedOffset>> {
    offset.from_local_datetime(&date.and_time(time)).single()
}

pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// First instant of `date` in the given offset.
pub fn start_of_day(offset: &FixedOffset, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|naive| offset.from_local_datetime(&naive).single())
}
