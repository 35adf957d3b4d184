//! Remote gateway: the spreadsheet web-app seen as an opaque HTTP collaborator.
//! Nothing here holds state; the gateway only translates and transports.

pub mod http;
pub mod wire;

use crate::errors::AppResult;
use crate::models::{AttendanceEvent, EventFilter, Student};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

pub use http::HttpGateway;

/// A submit request left this process without a transport error.
/// Whether the spreadsheet stored the row is unknown: the response is not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub dispatched_at: DateTime<Utc>,
}

impl Dispatch {
    pub fn now() -> Self {
        Self {
            dispatched_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// No endpoint address available.
    NotConfigured,
    /// The probe got an answer (its content is not trusted).
    Reachable,
    /// The probe was aborted after the connectivity timeout.
    TimedOut,
    /// Transport error before the timeout.
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Local store plus remote spreadsheet.
    Hybrid,
    /// Remote unusable right now; everything stays local.
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub state: Connectivity,
    pub mode: SyncMode,
    pub message: String,
    pub checked_at: DateTime<Utc>,
}

impl ConnectionStatus {
    pub fn new(state: Connectivity) -> Self {
        let (mode, message) = match state {
            Connectivity::Reachable => {
                (SyncMode::Hybrid, "hybrid mode: local store + remote sheet")
            }
            Connectivity::NotConfigured => (SyncMode::LocalOnly, "remote endpoint not configured"),
            Connectivity::TimedOut => (SyncMode::LocalOnly, "connection timed out: local mode"),
            Connectivity::Unreachable => {
                (SyncMode::LocalOnly, "offline: records are kept in the local store")
            }
        };
        Self {
            state,
            mode,
            message: message.to_string(),
            checked_at: Utc::now(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.state == Connectivity::Reachable
    }
}

/// Transport seam for the spreadsheet service. `HttpGateway` is the real
/// implementation; tests plug in their own.
#[async_trait]
pub trait AttendanceService: Send + Sync {
    /// Endpoint address, `None` when the remote side is disabled.
    fn endpoint(&self) -> Option<&str>;

    /// Fire-and-forget delivery of one event.
    async fn submit(&self, event: &AttendanceEvent) -> AppResult<Dispatch>;

    /// Every event the spreadsheet knows, restricted by `filter`.
    async fn fetch_all(&self, filter: &EventFilter) -> AppResult<Vec<AttendanceEvent>>;

    async fn fetch_students(&self) -> AppResult<Vec<Student>>;

    /// Connectivity check; never fails, never outlives `timeout`.
    async fn probe(&self, timeout: Duration) -> ConnectionStatus;

    /// Fire-and-forget trigger of a server-side automation.
    async fn trigger(&self, action: &str) -> AppResult<Dispatch>;
}
