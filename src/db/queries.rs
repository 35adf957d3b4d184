use crate::errors::{AppError, AppResult};
use crate::models::{
    AttendanceEvent, AttendanceStatus, EventFilter, EventOrigin, EventSource, StudentId,
};
use crate::utils::time::start_of_day;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use rusqlite::{Connection, Result, Row, params, params_from_iter};

const SELECT_EVENTS: &str = "SELECT id, student_id, student_name, status, timestamp,
        submitted_at, source, origin, synced_at
     FROM attendance_events";

/// Fixed-width UTC rendering, so text comparison follows time order.
pub(crate) fn utc_key(ts: &DateTime<FixedOffset>) -> String {
    ts.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

fn conversion_error(what: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(AppError::CorruptRecord(what)),
    )
}

fn parse_instant(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).map_err(|_| conversion_error(format!("timestamp {raw}")))
}

pub fn map_row(row: &Row) -> Result<AttendanceEvent> {
    let student_raw: String = row.get("student_id")?;
    let student_id = StudentId::parse(&student_raw)
        .map_err(|_| conversion_error(format!("student id {student_raw}")))?;

    let status_str: String = row.get("status")?;
    let status = AttendanceStatus::from_db_str(&status_str)
        .ok_or_else(|| conversion_error(format!("status {status_str}")))?;

    let source_str: String = row.get("source")?;
    let source = EventSource::from_db_str(&source_str)
        .ok_or_else(|| conversion_error(format!("source {source_str}")))?;

    let origin_str: String = row.get("origin")?;
    let origin = EventOrigin::from_db_str(&origin_str)
        .ok_or_else(|| conversion_error(format!("origin {origin_str}")))?;

    let timestamp = parse_instant(&row.get::<_, String>("timestamp")?)?;
    let submitted_at = parse_instant(&row.get::<_, String>("submitted_at")?)?.with_timezone(&Utc);
    let synced_at = match row.get::<_, Option<String>>("synced_at")? {
        Some(raw) => Some(parse_instant(&raw)?.with_timezone(&Utc)),
        None => None,
    };

    Ok(AttendanceEvent {
        id: row.get("id")?,
        student_id,
        student_name: row.get("student_name")?,
        status,
        timestamp,
        submitted_at: Some(submitted_at),
        source,
        origin,
        synced_at,
    })
}

pub fn insert_event(conn: &Connection, ev: &AttendanceEvent) -> AppResult<()> {
    let submitted_at = ev.submitted_at.unwrap_or_else(Utc::now);
    conn.execute(
        "INSERT INTO attendance_events
            (id, student_id, student_name, status, timestamp, timestamp_utc,
             submitted_at, source, origin, synced_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            ev.id,
            ev.student_id.as_str(),
            ev.student_name,
            ev.status.to_db_str(),
            ev.timestamp.to_rfc3339(),
            utc_key(&ev.timestamp),
            submitted_at.to_rfc3339(),
            ev.source.to_db_str(),
            ev.origin.to_db_str(),
            ev.synced_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

/// Load events matching `filter`, in insertion order. The day filter is
/// turned into a UTC half-open range computed in `offset`.
pub fn load_events(
    conn: &Connection,
    filter: &EventFilter,
    offset: &FixedOffset,
) -> AppResult<Vec<AttendanceEvent>> {
    let mut conditions: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some(date) = filter.date {
        let start = start_of_day(offset, date)
            .ok_or_else(|| AppError::InvalidDate(date.to_string()))?;
        let end = start + Duration::days(1);
        conditions.push("timestamp_utc >= ?");
        conditions.push("timestamp_utc < ?");
        args.push(utc_key(&start));
        args.push(utc_key(&end));
    }

    if let Some(id) = &filter.student_id {
        conditions.push("student_id = ?");
        args.push(id.as_str().to_string());
    }

    let mut sql = SELECT_EVENTS.to_string();
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY seq ASC");

    query_events(conn, &sql, &args)
}

pub fn load_events_by_source(
    conn: &Connection,
    source: EventSource,
) -> AppResult<Vec<AttendanceEvent>> {
    let sql = format!("{SELECT_EVENTS} WHERE source = ? ORDER BY seq ASC");
    query_events(conn, &sql, &[source.to_db_str().to_string()])
}

fn query_events(conn: &Connection, sql: &str, args: &[String]) -> AppResult<Vec<AttendanceEvent>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Update sync bookkeeping only; the event itself is never rewritten.
pub fn set_source(
    conn: &Connection,
    id: &str,
    source: EventSource,
    synced_at: Option<DateTime<Utc>>,
) -> AppResult<usize> {
    let changed = conn.execute(
        "UPDATE attendance_events SET source = ?1, synced_at = ?2 WHERE id = ?3",
        params![source.to_db_str(), synced_at.map(|t| t.to_rfc3339()), id],
    )?;
    Ok(changed)
}

pub fn delete_all_events(conn: &Connection) -> AppResult<usize> {
    let removed = conn.execute("DELETE FROM attendance_events", [])?;
    Ok(removed)
}
