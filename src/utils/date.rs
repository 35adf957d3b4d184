use chrono::{Duration, FixedOffset, NaiveDate, Utc};

/// Current calendar day in the school offset.
pub fn today(offset: &FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(offset).date_naive()
}

/// The `days` calendar days ending at `last` (inclusive), oldest first.
pub fn trailing_days(last: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days as i64)
        .rev()
        .map(|back| last - Duration::days(back))
        .collect()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// "Oct 19" style label used by the weekly trend.
pub fn short_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}
