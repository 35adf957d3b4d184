//! rAttendance library root.
//! Local-first morning attendance: check-in/check-out recording, spreadsheet
//! sync, reconciliation and completion statistics. Everything goes through
//! one `AttendanceApi` handle built from a `Config`.

pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod remote;
pub mod utils;

pub use config::Config;
pub use core::{AttendanceApi, Delivery, MonitorHandle, Provenance, RecordStore};
pub use errors::{AppError, AppResult, ErrorKind};
pub use export::ExportFormat;
pub use models::{AttendanceEvent, AttendanceInput, AttendanceStatus, EventFilter, StudentId};
pub use remote::{AttendanceService, ConnectionStatus, Connectivity, HttpGateway};

/// Open the API with the configuration found in the standard location.
pub fn open_default() -> AppResult<AttendanceApi> {
    let cfg = Config::load()?;
    AttendanceApi::open(cfg)
}
