//! Unified application error type.
//! All modules (db, remote, core, export) return AppError so that every
//! failure reaches the caller as a structured result with a readable message.

use serde::Serialize;
use std::io;
use thiserror::Error;

/// Coarse failure classes exposed to UI collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Network unreachable, timeout, remote not configured. Always recoverable.
    TransportFailure,
    /// Malformed remote payload.
    ParseFailure,
    /// Local write/read failed: no fallback remains below local storage.
    PersistenceFailure,
    /// Rejected before any I/O.
    ValidationFailure,
    /// Broken or unreadable configuration.
    ConfigurationFailure,
}

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO / local persistence
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    #[error("Corrupted stored record: {0}")]
    CorruptRecord(String),

    // ---------------------------
    // Remote gateway
    // ---------------------------
    #[error("Remote request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote request timed out after {0} s")]
    Timeout(u64),

    #[error("Remote endpoint is not configured")]
    RemoteNotConfigured,

    #[error("Remote service rejected the request: {0}")]
    RemoteRejected(String),

    #[error("Remote endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed remote payload: {0}")]
    Payload(#[from] serde_json::Error),

    // ---------------------------
    // Validation errors
    // ---------------------------
    #[error("Invalid student id '{0}': expected 5 digits")]
    InvalidStudentId(String),

    #[error("Invalid attendance status: {0}")]
    InvalidStatus(String),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid automation action: {0}")]
    InvalidAction(String),

    #[error("Student {0} not found in roster")]
    UnknownStudent(String),

    #[error("Student roster is not available")]
    RosterUnavailable,

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("No data to export")]
    NothingToExport,

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Io(_)
            | AppError::Db(_)
            | AppError::Migration(_)
            | AppError::CorruptRecord(_)
            | AppError::Export(_) => ErrorKind::PersistenceFailure,

            AppError::Transport(_)
            | AppError::Timeout(_)
            | AppError::RemoteNotConfigured
            | AppError::RemoteRejected(_)
            | AppError::Unreachable(_) => ErrorKind::TransportFailure,

            AppError::Payload(_) => ErrorKind::ParseFailure,

            AppError::InvalidStudentId(_)
            | AppError::InvalidStatus(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidTime(_)
            | AppError::InvalidEndpoint(_)
            | AppError::InvalidAction(_)
            | AppError::UnknownStudent(_)
            | AppError::RosterUnavailable
            | AppError::NothingToExport => ErrorKind::ValidationFailure,

            AppError::Config(_) | AppError::ConfigParse(_) => ErrorKind::ConfigurationFailure,
        }
    }

    /// True when the failure only means "remote unavailable" and the caller
    /// can carry on with local data.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransportFailure | ErrorKind::ParseFailure
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
