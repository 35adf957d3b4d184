use serde::{Deserialize, Serialize};

/// Wire label the spreadsheet service uses for a check-in.
pub const CHECK_IN_LABEL: &str = "입실";
/// Wire label the spreadsheet service uses for a check-out.
pub const CHECK_OUT_LABEL: &str = "퇴실";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    CheckIn,
    CheckOut,
}

impl AttendanceStatus {
    /// Parse user or remote input. Accepts the service labels and a few
    /// English aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            CHECK_IN_LABEL => Some(Self::CheckIn),
            CHECK_OUT_LABEL => Some(Self::CheckOut),
            other => match other.to_lowercase().as_str() {
                "in" | "check_in" | "checkin" | "check-in" => Some(Self::CheckIn),
                "out" | "check_out" | "checkout" | "check-out" => Some(Self::CheckOut),
                _ => None,
            },
        }
    }

    /// Label sent to the remote service and written in CSV exports.
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::CheckIn => CHECK_IN_LABEL,
            AttendanceStatus::CheckOut => CHECK_OUT_LABEL,
        }
    }

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AttendanceStatus::CheckIn => "in",
            AttendanceStatus::CheckOut => "out",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(AttendanceStatus::CheckIn),
            "out" => Some(AttendanceStatus::CheckOut),
            _ => None,
        }
    }

    /// Suffix appended to a remote row id for the event it expands into.
    pub fn id_suffix(&self) -> &'static str {
        match self {
            AttendanceStatus::CheckIn => "checkin",
            AttendanceStatus::CheckOut => "checkout",
        }
    }
}
