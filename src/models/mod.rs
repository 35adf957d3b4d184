pub mod backfill;
pub mod day_summary;
pub mod event;
pub mod source;
pub mod status;
pub mod student;

pub use backfill::{BackfillKind, BackfillRecord};
pub use day_summary::{DailyStats, DayState, DayTrend, StudentDayStatus};
pub use event::{AttendanceEvent, AttendanceInput, EventFilter, NewEvent};
pub use source::{EventOrigin, EventSource};
pub use status::AttendanceStatus;
pub use student::{Roster, RosterSource, Student, StudentId};
