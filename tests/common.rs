#![allow(dead_code)]
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rattendance::config::Config;
use rattendance::core::{AttendanceApi, RecordStore};
use rattendance::errors::{AppError, AppResult};
use rattendance::models::{
    AttendanceEvent, AttendanceStatus, EventFilter, EventOrigin, EventSource, NewEvent, Student,
    StudentId,
};
use rattendance::remote::{AttendanceService, ConnectionStatus, Connectivity, Dispatch};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ENDPOINT: &str = "https://script.example.com/macros/s/test/exec";

pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// `date` + `HH:MM` in the school offset.
pub fn ts(date: &str, hm: &str) -> DateTime<FixedOffset> {
    let time = NaiveTime::parse_from_str(hm, "%H:%M").unwrap();
    day(date)
        .and_time(time)
        .and_local_timezone(kst())
        .single()
        .unwrap()
}

pub fn sid(s: &str) -> StudentId {
    StudentId::parse(s).unwrap()
}

pub fn new_event(
    student: &str,
    name: &str,
    status: AttendanceStatus,
    at: DateTime<FixedOffset>,
) -> NewEvent {
    NewEvent::new(sid(student), name, status, at)
}

/// Event as the spreadsheet would report it.
pub fn remote_event(
    row: &str,
    student: &str,
    name: &str,
    status: AttendanceStatus,
    at: DateTime<FixedOffset>,
) -> AttendanceEvent {
    AttendanceEvent {
        id: format!("{row}-{}", status.id_suffix()),
        student_id: sid(student),
        student_name: name.to_string(),
        status,
        timestamp: at,
        submitted_at: None,
        source: EventSource::RemoteOnly,
        origin: EventOrigin::Recorded,
        synced_at: None,
    }
}

pub fn student(id: &str, name: &str) -> Student {
    Student {
        student_id: sid(id),
        student_name: name.to_string(),
    }
}

/// In-memory store in the school offset.
pub fn memory_store() -> RecordStore {
    RecordStore::in_memory(kst()).unwrap()
}

pub fn test_config() -> Config {
    Config::with_database(":memory:")
}

/// Scriptable stand-in for the spreadsheet service.
#[derive(Default)]
pub struct FakeGateway {
    pub endpoint: Option<String>,
    pub remote_events: Mutex<Vec<AttendanceEvent>>,
    pub students: Mutex<Vec<Student>>,
    pub fail_fetch: bool,
    pub fail_submit: bool,
    pub fail_students: bool,
    pub probe_delay: Option<Duration>,
    pub submitted: Mutex<Vec<AttendanceEvent>>,
    pub triggered: Mutex<Vec<String>>,
    pub probes: AtomicUsize,
}

impl FakeGateway {
    pub fn online() -> Self {
        Self {
            endpoint: Some(ENDPOINT.to_string()),
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self {
            endpoint: Some(ENDPOINT.to_string()),
            fail_fetch: true,
            fail_submit: true,
            fail_students: true,
            ..Self::default()
        }
    }

    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with_remote(self, events: Vec<AttendanceEvent>) -> Self {
        *self.remote_events.lock().unwrap() = events;
        self
    }

    pub fn with_students(self, students: Vec<Student>) -> Self {
        *self.students.lock().unwrap() = students;
        self
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn down() -> AppError {
        AppError::Unreachable("connection refused".to_string())
    }
}

#[async_trait]
impl AttendanceService for FakeGateway {
    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    async fn submit(&self, event: &AttendanceEvent) -> AppResult<Dispatch> {
        if self.endpoint.is_none() {
            return Err(AppError::RemoteNotConfigured);
        }
        if self.fail_submit {
            return Err(Self::down());
        }
        self.submitted.lock().unwrap().push(event.clone());
        Ok(Dispatch::now())
    }

    async fn fetch_all(&self, filter: &EventFilter) -> AppResult<Vec<AttendanceEvent>> {
        if self.endpoint.is_none() {
            return Err(AppError::RemoteNotConfigured);
        }
        if self.fail_fetch {
            return Err(Self::down());
        }
        let offset = kst();
        Ok(self
            .remote_events
            .lock()
            .unwrap()
            .iter()
            .filter(|ev| filter.matches(ev, &offset))
            .cloned()
            .collect())
    }

    async fn fetch_students(&self) -> AppResult<Vec<Student>> {
        if self.endpoint.is_none() {
            return Err(AppError::RemoteNotConfigured);
        }
        if self.fail_students {
            return Err(Self::down());
        }
        Ok(self.students.lock().unwrap().clone())
    }

    async fn probe(&self, _timeout: Duration) -> ConnectionStatus {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.probe_delay {
            tokio::time::sleep(delay).await;
        }
        let state = match (&self.endpoint, self.fail_fetch) {
            (None, _) => Connectivity::NotConfigured,
            (Some(_), true) => Connectivity::Unreachable,
            (Some(_), false) => Connectivity::Reachable,
        };
        ConnectionStatus::new(state)
    }

    async fn trigger(&self, action: &str) -> AppResult<Dispatch> {
        if self.fail_submit {
            return Err(Self::down());
        }
        self.triggered.lock().unwrap().push(action.to_string());
        Ok(Dispatch::now())
    }
}

/// API over an in-memory store and the given fake.
pub fn api_with(gateway: FakeGateway) -> (AttendanceApi, Arc<FakeGateway>) {
    let fake = Arc::new(gateway);
    let api = AttendanceApi::with_parts(test_config(), memory_store(), fake.clone());
    (api, fake)
}

/// API over an already populated store.
pub fn api_over(store: RecordStore, gateway: FakeGateway) -> (AttendanceApi, Arc<FakeGateway>) {
    let fake = Arc::new(gateway);
    let api = AttendanceApi::with_parts(test_config(), store, fake.clone());
    (api, fake)
}

/// Store pre-filled with locally recorded swipes.
pub fn store_with(events: Vec<NewEvent>) -> RecordStore {
    let mut store = memory_store();
    store.append_all(events, EventSource::Offline).unwrap();
    store
}
