use serde::{Deserialize, Serialize};

/// Provenance of a stored event. Only sync bookkeeping looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Stored locally, remote delivery not dispatched yet.
    Offline,
    /// Stored locally, remote delivery dispatched at submit time.
    OnlineBackup,
    /// Stored locally while offline, later delivered by a sync pass.
    RemoteSynced,
    /// Exists only in the remote spreadsheet.
    RemoteOnly,
}

impl EventSource {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EventSource::Offline => "offline",
            EventSource::OnlineBackup => "online_backup",
            EventSource::RemoteSynced => "synced",
            EventSource::RemoteOnly => "remote",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "offline" => Some(EventSource::Offline),
            "online_backup" => Some(EventSource::OnlineBackup),
            "synced" => Some(EventSource::RemoteSynced),
            "remote" => Some(EventSource::RemoteOnly),
            _ => None,
        }
    }
}

/// Whether an event is a genuine swipe or was synthesized by the backfill policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    #[default]
    Recorded,
    Policy,
}

impl EventOrigin {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EventOrigin::Recorded => "recorded",
            EventOrigin::Policy => "policy",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "recorded" => Some(EventOrigin::Recorded),
            "policy" => Some(EventOrigin::Policy),
            _ => None,
        }
    }

    /// Value of the `source` form field sent to the remote service.
    pub fn wire_source(&self) -> &'static str {
        match self {
            EventOrigin::Recorded => "web_interface",
            EventOrigin::Policy => "backfill_policy",
        }
    }
}
