use crate::errors::AppResult;
use crate::models::AttendanceEvent;

/// Pretty-printed dump of raw events.
pub fn render_json(events: &[AttendanceEvent]) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(events)?)
}
