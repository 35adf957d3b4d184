pub mod aggregate;
pub mod api;
pub mod backfill;
pub mod monitor;
pub mod reconcile;
pub mod record_store;

pub use api::{
    AttendanceApi, AttendanceView, BackfillPlan, Delivery, Reported, SubmitReceipt, SyncReport,
    SystemInfo,
};
pub use monitor::{MonitorHandle, spawn_monitor};
pub use reconcile::{DedupKey, Provenance, merge};
pub use record_store::RecordStore;
