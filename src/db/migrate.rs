use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, Result};
use tracing::info;

/// Current schema version, stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Create the attendance collection. `seq` keeps insertion order,
/// `timestamp_utc` is a fixed-width UTC rendering used for day-range filters.
fn create_events_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_events (
            seq           INTEGER PRIMARY KEY AUTOINCREMENT,
            id            TEXT NOT NULL UNIQUE,
            student_id    TEXT NOT NULL,
            student_name  TEXT NOT NULL DEFAULT '',
            status        TEXT NOT NULL CHECK(status IN ('in','out')),
            timestamp     TEXT NOT NULL,
            timestamp_utc TEXT NOT NULL,
            submitted_at  TEXT NOT NULL,
            source        TEXT NOT NULL DEFAULT 'offline'
                          CHECK(source IN ('offline','online_backup','synced','remote')),
            origin        TEXT NOT NULL DEFAULT 'recorded' CHECK(origin IN ('recorded','policy')),
            synced_at     TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_attendance_ts ON attendance_events(timestamp_utc);
        CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance_events(student_id);
        CREATE INDEX IF NOT EXISTS idx_attendance_source ON attendance_events(source);
        "#,
    )?;
    Ok(())
}

/// Key/value table: cached roster, its update time and the endpoint address.
fn create_settings_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn events_table_exists(conn: &Connection) -> Result<bool> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='attendance_events'",
    )?;
    let exists: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

/// Bring the schema up to `SCHEMA_VERSION`. Idempotent.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version > SCHEMA_VERSION {
        return Err(AppError::Migration(format!(
            "database schema v{version} is newer than supported v{SCHEMA_VERSION}"
        )));
    }

    let fresh = !events_table_exists(conn)?;

    ensure_log_table(conn)?;
    create_events_table(conn)?;
    create_settings_table(conn)?;

    if version < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
        if fresh {
            info!(version = SCHEMA_VERSION, "attendance schema created");
        } else {
            info!(from = version, to = SCHEMA_VERSION, "attendance schema upgraded");
        }
    }

    Ok(())
}
