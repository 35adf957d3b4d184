use crate::errors::AppResult;
use chrono::{DateTime, FixedOffset};
use rusqlite::{Connection, OptionalExtension};

pub fn count_events(conn: &Connection) -> AppResult<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM attendance_events", [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

/// Timestamp of the most recent swipe in the store, if any.
pub fn latest_timestamp(conn: &Connection) -> AppResult<Option<DateTime<FixedOffset>>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT timestamp FROM attendance_events ORDER BY timestamp_utc DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()))
}
