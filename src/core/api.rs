//! `AttendanceApi`: the handle UI collaborators hold. Built once from an
//! immutable `Config`; every operation returns `AppResult`.

use crate::config::Config;
use crate::core::aggregate::{daily_stats, day_status, day_status_with_roster, weekly_stats};
use crate::core::backfill::detect_and_synthesize;
use crate::core::monitor::{MonitorHandle, spawn_monitor};
use crate::core::reconcile::{Provenance, merge};
use crate::core::record_store::RecordStore;
use crate::db::log::ttlog;
use crate::db::settings::{self, KEY_STUDENT_LIST, KEY_WEBAPP_URL};
use crate::errors::{AppError, AppResult};
use crate::export::{ExportFormat, export_events};
use crate::models::{
    AttendanceEvent, AttendanceInput, BackfillRecord, DailyStats, DayTrend, EventFilter,
    EventOrigin, EventSource, NewEvent, Roster, RosterSource, Student, StudentId,
};
use crate::remote::{
    AttendanceService, ConnectionStatus, Connectivity, Dispatch, HttpGateway, SyncMode,
};
use crate::utils::date::today;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of the remote half of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Delivery {
    /// Request sent; whether the sheet stored it is unknown.
    Dispatched { at: DateTime<Utc> },
    /// Transport failed; the record waits for `sync_pending`.
    Failed { reason: String },
    /// No endpoint; the record waits for `sync_pending`.
    NotConfigured,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub event: AttendanceEvent,
    pub delivery: Delivery,
    pub message: String,
}

/// Reconciled events plus where they came from.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceView {
    pub events: Vec<AttendanceEvent>,
    pub provenance: Provenance,
    pub remote_count: usize,
    pub local_count: usize,
}

impl AttendanceView {
    pub fn total(&self) -> usize {
        self.events.len()
    }
}

/// Derived data tagged with the provenance of the events behind it.
#[derive(Debug, Clone, Serialize)]
pub struct Reported<T> {
    pub data: T,
    pub provenance: Provenance,
}

/// Policy records awaiting an explicit `commit_backfill`.
#[derive(Debug, Clone, Serialize)]
pub struct BackfillPlan {
    pub date: NaiveDate,
    pub records: Vec<BackfillRecord>,
    pub provenance: Provenance,
    /// Whether roster students without any event were considered.
    pub roster_applied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub total: usize,
    pub synced: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub mode: SyncMode,
    pub endpoint: Option<String>,
    pub local_records: i64,
    pub pending_sync: usize,
    pub last_update: Option<DateTime<FixedOffset>>,
    /// When the cached roster was last refreshed from the remote side.
    pub roster_updated: Option<DateTime<FixedOffset>>,
    pub version: &'static str,
}

pub struct AttendanceApi {
    config: Config,
    offset: FixedOffset,
    store: RecordStore,
    gateway: Arc<dyn AttendanceService>,
}

impl AttendanceApi {
    /// Open the configured database and build the HTTP gateway. A saved
    /// `webapp_url` setting wins over `config.endpoint`.
    pub fn open(config: Config) -> AppResult<Self> {
        let offset = config.offset()?;
        let store = RecordStore::open(&config.database_path(), offset)?;
        let endpoint = settings::get_setting(store.conn(), KEY_WEBAPP_URL)?
            .or_else(|| config.endpoint.clone());
        let gateway = Arc::new(HttpGateway::new(endpoint, offset, config.request_timeout()));
        Ok(Self {
            config,
            offset,
            store,
            gateway,
        })
    }

    /// Assemble from already-built parts (embedding, tests).
    pub fn with_parts(
        config: Config,
        store: RecordStore,
        gateway: Arc<dyn AttendanceService>,
    ) -> Self {
        let offset = *store.offset();
        Self {
            config,
            offset,
            store,
            gateway,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn gateway(&self) -> Arc<dyn AttendanceService> {
        Arc::clone(&self.gateway)
    }

    pub fn today(&self) -> NaiveDate {
        today(&self.offset)
    }

    /// Run a gateway call under the request timeout.
    async fn bounded<T>(&self, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        let limit = self.config.request_timeout();
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| AppError::Timeout(limit.as_secs()))?
    }

    // ---------------------------------------------------------------
    // Submission
    // ---------------------------------------------------------------

    /// Validate raw input, then `submit`.
    pub async fn submit_input(&mut self, input: AttendanceInput) -> AppResult<SubmitReceipt> {
        let new = input.validate(&self.offset)?;
        self.submit(new).await
    }

    /// Local write first (the commit point), then a bounded remote attempt.
    /// A failed local write is the only failing outcome.
    pub async fn submit(&mut self, new: NewEvent) -> AppResult<SubmitReceipt> {
        let mut event = self.store.append(new, EventSource::Offline)?;

        if self.gateway.endpoint().is_none() {
            return Ok(SubmitReceipt {
                message: format!(
                    "{} {} stored locally (remote not configured)",
                    event.student_name,
                    event.status.label()
                ),
                event,
                delivery: Delivery::NotConfigured,
            });
        }

        let gateway = Arc::clone(&self.gateway);
        match self.bounded(gateway.submit(&event)).await {
            Ok(Dispatch { dispatched_at }) => {
                match self.store.mark_delivered(&event.id) {
                    Ok(_) => event.source = EventSource::OnlineBackup,
                    Err(e) => warn!(id = %event.id, error = %e, "could not record dispatch"),
                }
                Ok(SubmitReceipt {
                    message: format!(
                        "{} {} sent to the remote sheet",
                        event.student_name,
                        event.status.label()
                    ),
                    event,
                    delivery: Delivery::Dispatched { at: dispatched_at },
                })
            }
            Err(e) => {
                warn!(id = %event.id, error = %e, "remote submit failed, kept locally");
                Ok(SubmitReceipt {
                    message: "remote unavailable: stored locally, will be synced later".to_string(),
                    event,
                    delivery: Delivery::Failed {
                        reason: e.to_string(),
                    },
                })
            }
        }
    }

    /// Resubmit every record whose delivery was never dispatched.
    pub async fn sync_pending(&mut self) -> AppResult<SyncReport> {
        if self.gateway.endpoint().is_none() {
            return Err(AppError::RemoteNotConfigured);
        }

        let pending = self.store.pending_sync()?;
        let mut report = SyncReport {
            total: pending.len(),
            ..SyncReport::default()
        };

        let gateway = Arc::clone(&self.gateway);
        for event in &pending {
            match self.bounded(gateway.submit(event)).await {
                Ok(dispatch) => {
                    self.store.mark_synced(&event.id, dispatch.dispatched_at)?;
                    report.synced += 1;
                }
                Err(e) => {
                    warn!(id = %event.id, error = %e, "sync of record failed");
                    report.failed += 1;
                }
            }
        }

        if report.total > 0 {
            ttlog(
                self.store.conn(),
                "sync",
                "",
                &format!("{}/{} records synced", report.synced, report.total),
            )?;
        }
        info!(synced = report.synced, failed = report.failed, "sync pass finished");
        Ok(report)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Local + remote, reconciled. A remote failure degrades to local data
    /// tagged `LocalFallback`; only a local failure is an error.
    pub async fn get_attendance_data(&self, filter: &EventFilter) -> AppResult<AttendanceView> {
        let local = self.store.query(filter)?;

        let (remote, provenance) = match self.bounded(self.gateway.fetch_all(filter)).await {
            Ok(events) => (events, Provenance::Hybrid),
            Err(e) => {
                warn!(error = %e, "remote fetch failed, using local data only");
                (
                    Vec::new(),
                    Provenance::LocalFallback {
                        reason: e.to_string(),
                    },
                )
            }
        };

        Ok(AttendanceView {
            events: merge(&remote, &local),
            provenance,
            remote_count: remote.len(),
            local_count: local.len(),
        })
    }

    pub async fn daily_stats(&self, date: NaiveDate) -> AppResult<Reported<DailyStats>> {
        let view = self.get_attendance_data(&EventFilter::for_date(date)).await?;
        Ok(Reported {
            data: daily_stats(date, day_status(&view.events)),
            provenance: view.provenance,
        })
    }

    pub async fn today_stats(&self) -> AppResult<Reported<DailyStats>> {
        self.daily_stats(self.today()).await
    }

    /// Seven days ending at `last_day`, oldest first.
    pub async fn weekly_stats_ending(
        &self,
        last_day: NaiveDate,
    ) -> AppResult<Reported<Vec<DayTrend>>> {
        let view = self.get_attendance_data(&EventFilter::all()).await?;
        Ok(Reported {
            data: weekly_stats(last_day, &view.events, &self.offset),
            provenance: view.provenance,
        })
    }

    pub async fn weekly_stats(&self) -> AppResult<Reported<Vec<DayTrend>>> {
        self.weekly_stats_ending(self.today()).await
    }

    /// Reconciled history of one student. The id is checked before any I/O.
    pub async fn student_records(&self, student_id: &str) -> AppResult<AttendanceView> {
        let id = StudentId::parse(student_id)?;
        self.get_attendance_data(&EventFilter::for_student(id)).await
    }

    // ---------------------------------------------------------------
    // Backfill
    // ---------------------------------------------------------------

    /// Policy records for `date`. Uses the roster when one is available so
    /// that students without any swipe are detected too. Nothing is stored.
    pub async fn process_missing(&self, date: NaiveDate) -> AppResult<BackfillPlan> {
        let view = self.get_attendance_data(&EventFilter::for_date(date)).await?;
        let roster = match self.student_list().await {
            Ok(roster) => Some(roster.students),
            Err(e) => {
                warn!(error = %e, "roster unavailable, backfill limited to students with events");
                None
            }
        };

        let statuses = match &roster {
            Some(students) => day_status_with_roster(&view.events, students),
            None => day_status(&view.events),
        };

        Ok(BackfillPlan {
            date,
            records: detect_and_synthesize(date, &statuses, &self.offset),
            provenance: view.provenance,
            roster_applied: roster.is_some(),
        })
    }

    /// Store reviewed policy records as `EventOrigin::Policy` events. A
    /// record already committed for the same student, day and status is
    /// skipped, so committing a plan twice stores it once.
    pub fn commit_backfill(
        &mut self,
        records: &[BackfillRecord],
    ) -> AppResult<Vec<AttendanceEvent>> {
        let mut batch = Vec::new();
        for rec in records {
            let filter = EventFilter {
                date: Some(rec.date),
                student_id: Some(rec.student_id.clone()),
            };
            let already = self
                .store
                .query(&filter)?
                .iter()
                .any(|ev| ev.is_policy_generated() && ev.status == rec.status);
            let queued = batch
                .iter()
                .any(|n: &NewEvent| n.student_id == rec.student_id && n.status == rec.status);
            if already || queued {
                continue;
            }
            batch.push(
                NewEvent::new(
                    rec.student_id.clone(),
                    rec.student_name.clone(),
                    rec.status,
                    rec.timestamp,
                )
                .with_origin(EventOrigin::Policy),
            );
        }

        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let stored = self.store.append_all(batch, EventSource::Offline)?;
        ttlog(
            self.store.conn(),
            "backfill",
            "",
            &format!("{} policy records committed", stored.len()),
        )?;
        Ok(stored)
    }

    // ---------------------------------------------------------------
    // Roster
    // ---------------------------------------------------------------

    fn cached_roster(&self) -> AppResult<Option<Vec<Student>>> {
        let Some(raw) = settings::get_setting(self.store.conn(), KEY_STUDENT_LIST)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Vec<Student>>(&raw) {
            Ok(list) => Ok(Some(list)),
            Err(e) => {
                warn!(error = %e, "cached roster unreadable, ignoring it");
                Ok(None)
            }
        }
    }

    /// Remote roster with write-through cache; cache when the remote side is
    /// missing or failing.
    pub async fn student_list(&self) -> AppResult<Roster> {
        let mut source = RosterSource::Cache;

        if self.gateway.endpoint().is_some() {
            match self.bounded(self.gateway.fetch_students()).await {
                Ok(students) if !students.is_empty() => {
                    let json = serde_json::to_string(&students)?;
                    if let Err(e) = settings::cache_student_list(self.store.conn(), &json) {
                        warn!(error = %e, "could not cache roster");
                    }
                    return Ok(Roster {
                        students,
                        source: RosterSource::Remote,
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "roster fetch failed, trying cache");
                    source = RosterSource::CacheFallback;
                }
            }
        }

        match self.cached_roster()? {
            Some(students) => Ok(Roster { students, source }),
            None => Err(AppError::RosterUnavailable),
        }
    }

    pub async fn student_name(&self, student_id: &str) -> AppResult<Student> {
        let id = StudentId::parse(student_id)?;
        let roster = self.student_list().await?;
        roster
            .find(&id)
            .cloned()
            .ok_or_else(|| AppError::UnknownStudent(id.to_string()))
    }

    // ---------------------------------------------------------------
    // Remote administration
    // ---------------------------------------------------------------

    pub async fn check_connection(&self) -> ConnectionStatus {
        let limit = self.config.connectivity_timeout();
        tokio::time::timeout(limit, self.gateway.probe(limit))
            .await
            .unwrap_or_else(|_| ConnectionStatus::new(Connectivity::TimedOut))
    }

    /// Validate and probe `url`, then persist it and route every later
    /// remote call through it.
    pub async fn configure_endpoint(&mut self, url: &str) -> AppResult<ConnectionStatus> {
        let parsed = HttpGateway::validate_endpoint(url)?;
        let gateway = HttpGateway::new(
            Some(parsed.to_string()),
            self.offset,
            self.config.request_timeout(),
        );

        let limit = self.config.connectivity_timeout();
        let status = tokio::time::timeout(limit, gateway.probe(limit))
            .await
            .unwrap_or_else(|_| ConnectionStatus::new(Connectivity::TimedOut));
        if !status.is_online() {
            return Err(AppError::Unreachable(status.message));
        }

        settings::set_setting(self.store.conn(), KEY_WEBAPP_URL, parsed.as_str())?;
        ttlog(self.store.conn(), "endpoint", parsed.as_str(), "remote endpoint configured")?;
        self.gateway = Arc::new(gateway);
        info!(endpoint = %parsed, "remote endpoint configured");
        Ok(status)
    }

    /// Fire-and-forget trigger of a server-side automation such as
    /// `processMissing`.
    pub async fn trigger_automation(&self, action: &str) -> AppResult<Dispatch> {
        let action = action.trim();
        if action.is_empty() || !action.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::InvalidAction(action.to_string()));
        }
        if self.gateway.endpoint().is_none() {
            return Err(AppError::RemoteNotConfigured);
        }
        self.bounded(self.gateway.trigger(action)).await
    }

    /// Start the periodic connectivity poll with the configured interval.
    pub fn start_monitor(&self) -> MonitorHandle {
        spawn_monitor(
            self.gateway(),
            self.config.poll_interval(),
            self.config.connectivity_timeout(),
        )
    }

    // ---------------------------------------------------------------
    // Local maintenance
    // ---------------------------------------------------------------

    pub fn system_info(&self) -> AppResult<SystemInfo> {
        let endpoint = self.gateway.endpoint().map(str::to_string);
        Ok(SystemInfo {
            mode: if endpoint.is_some() {
                SyncMode::Hybrid
            } else {
                SyncMode::LocalOnly
            },
            endpoint,
            local_records: self.store.count()?,
            pending_sync: self.store.pending_sync()?.len(),
            last_update: self.store.latest_timestamp()?,
            roster_updated: settings::student_list_updated(self.store.conn())?,
            version: env!("CARGO_PKG_VERSION"),
        })
    }

    pub fn clear_local_data(&mut self) -> AppResult<usize> {
        self.store.clear()
    }

    /// Write every local record to `<dir>/<prefix>_<today>.<ext>`.
    pub fn export(&self, format: ExportFormat, dir: &Path) -> AppResult<PathBuf> {
        let events = self.store.query(&EventFilter::all())?;
        export_events(
            &events,
            format,
            dir,
            &self.config.export_prefix,
            self.today(),
            &self.offset,
        )
    }
}
