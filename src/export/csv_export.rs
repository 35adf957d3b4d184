use crate::errors::{AppError, AppResult};
use crate::models::AttendanceEvent;
use chrono::FixedOffset;

/// UTF-8 byte-order mark, so spreadsheet apps keep non-ASCII names intact.
const BOM: &[u8] = b"\xEF\xBB\xBF";

pub const CSV_HEADERS: [&str; 5] = ["date", "student_id", "name", "status", "time"];

/// BOM + header + one line per event, date and time in the school offset.
pub fn render_csv(events: &[AttendanceEvent], offset: &FixedOffset) -> AppResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(BOM.to_vec());

    wtr.write_record(CSV_HEADERS)?;

    for ev in events {
        let local = ev.timestamp.with_timezone(offset);
        wtr.write_record([
            local.format("%Y-%m-%d").to_string(),
            ev.student_id.to_string(),
            ev.student_name.clone(),
            ev.status.label().to_string(),
            local.format("%H:%M:%S").to_string(),
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| AppError::Io(std::io::Error::other(format!("CSV flush error: {e}"))))
}
