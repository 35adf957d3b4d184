//! Key/value settings persisted next to the attendance collection.

use crate::errors::AppResult;
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::{Connection, OptionalExtension, params};

pub const KEY_STUDENT_LIST: &str = "student_list";
pub const KEY_STUDENT_LIST_UPDATED: &str = "student_list_updated";
pub const KEY_WEBAPP_URL: &str = "webapp_url";

pub fn get_setting(conn: &Connection, key: &str) -> AppResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// Store the roster JSON together with its refresh time.
pub fn cache_student_list(conn: &Connection, json: &str) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;
    set_setting(&tx, KEY_STUDENT_LIST, json)?;
    set_setting(&tx, KEY_STUDENT_LIST_UPDATED, &Utc::now().to_rfc3339())?;
    tx.commit()?;
    Ok(())
}

pub fn student_list_updated(conn: &Connection) -> AppResult<Option<DateTime<FixedOffset>>> {
    Ok(get_setting(conn, KEY_STUDENT_LIST_UPDATED)?
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok()))
}
