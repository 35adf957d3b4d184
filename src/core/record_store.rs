//! Durable local collection of attendance events. The only owner of the
//! `attendance_events` table; every mutation is written immediately.

use crate::db::initialize::init_db;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::{queries, stats};
use crate::errors::{AppError, AppResult};
use crate::models::{AttendanceEvent, EventFilter, EventSource, NewEvent};
use chrono::{DateTime, FixedOffset, Utc};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;
use ulid::Ulid;

pub struct RecordStore {
    pool: DbPool,
    offset: FixedOffset,
}

impl RecordStore {
    pub fn open(path: &Path, offset: FixedOffset) -> AppResult<Self> {
        Self::from_pool(DbPool::new(path)?, offset)
    }

    pub fn in_memory(offset: FixedOffset) -> AppResult<Self> {
        Self::from_pool(DbPool::in_memory()?, offset)
    }

    fn from_pool(pool: DbPool, offset: FixedOffset) -> AppResult<Self> {
        init_db(&pool.conn)?;
        Ok(Self { pool, offset })
    }

    pub fn offset(&self) -> &FixedOffset {
        &self.offset
    }

    /// Shared connection for settings and the audit log.
    pub fn conn(&self) -> &Connection {
        &self.pool.conn
    }

    /// Assign `id` + `submitted_at` and persist. The event is stored as
    /// `source`; submissions start as `Offline` until a dispatch is known.
    pub fn append(&mut self, new: NewEvent, source: EventSource) -> AppResult<AttendanceEvent> {
        let mut stored = self.append_all(vec![new], source)?;
        stored
            .pop()
            .ok_or_else(|| AppError::CorruptRecord("append produced no record".into()))
    }

    /// Persist several events in one transaction: all or none.
    pub fn append_all(
        &mut self,
        batch: Vec<NewEvent>,
        source: EventSource,
    ) -> AppResult<Vec<AttendanceEvent>> {
        let now = Utc::now();
        let events: Vec<AttendanceEvent> = batch
            .into_iter()
            .map(|new| AttendanceEvent {
                id: Ulid::new().to_string(),
                student_id: new.student_id,
                student_name: new.student_name,
                status: new.status,
                timestamp: new.timestamp,
                submitted_at: Some(now),
                source,
                origin: new.origin,
                synced_at: None,
            })
            .collect();

        self.pool.with_conn(|conn| {
            let tx = conn.transaction()?;
            for event in &events {
                queries::insert_event(&tx, event)?;
                ttlog(
                    &tx,
                    "append",
                    event.student_id.as_str(),
                    &format!(
                        "{} {} at {} ({})",
                        event.id,
                        event.status.to_db_str(),
                        event.timestamp.to_rfc3339(),
                        event.origin.to_db_str()
                    ),
                )?;
            }
            tx.commit()?;
            Ok(())
        })?;

        debug!(count = events.len(), "events stored locally");
        Ok(events)
    }

    /// Events matching the filter, in insertion order.
    pub fn query(&self, filter: &EventFilter) -> AppResult<Vec<AttendanceEvent>> {
        queries::load_events(&self.pool.conn, filter, &self.offset)
    }

    /// Empty the collection. Irreversible.
    pub fn clear(&mut self) -> AppResult<usize> {
        self.pool.with_conn(|conn| {
            let tx = conn.transaction()?;
            let removed = queries::delete_all_events(&tx)?;
            ttlog(&tx, "clear", "", &format!("{removed} local records removed"))?;
            tx.commit()?;
            Ok(removed)
        })
    }

    /// Events whose remote delivery was never dispatched.
    pub fn pending_sync(&self) -> AppResult<Vec<AttendanceEvent>> {
        queries::load_events_by_source(&self.pool.conn, EventSource::Offline)
    }

    /// Submit-time dispatch succeeded: `Offline` → `OnlineBackup`.
    pub fn mark_delivered(&mut self, id: &str) -> AppResult<bool> {
        Ok(queries::set_source(&self.pool.conn, id, EventSource::OnlineBackup, None)? > 0)
    }

    /// Delivered later by a sync pass: `Offline` → `RemoteSynced`.
    pub fn mark_synced(&mut self, id: &str, at: DateTime<Utc>) -> AppResult<bool> {
        Ok(queries::set_source(&self.pool.conn, id, EventSource::RemoteSynced, Some(at))? > 0)
    }

    pub fn count(&self) -> AppResult<i64> {
        stats::count_events(&self.pool.conn)
    }

    pub fn latest_timestamp(&self) -> AppResult<Option<DateTime<FixedOffset>>> {
        stats::latest_timestamp(&self.pool.conn)
    }
}
