//! Date helpers for the calendar events query.

use chrono::{Datelike, NaiveDate};

use crate::PolarFlowError;

/// Parse an ISO-8601 date into a calendar date.
///
/// Accepts:
/// - YYYY-MM-DD
/// - basic format YYYYMMDD
/// - RFC3339 datetime (date part in its own offset)
/// - Naive datetime YYYY-MM-DDTHH:MM:SS or YYYY-MM-DDTHH:MM
pub fn parse_calendar_date(s: &str) -> Result<NaiveDate, PolarFlowError> {
    let trimmed = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(d);
    }
    if trimmed.len() == 8
        && trimmed.bytes().all(|b| b.is_ascii_digit())
        && let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y%m%d")
    {
        return Ok(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(ndt.date());
        }
    }
    Err(PolarFlowError::DateParse {
        input: s.to_string(),
    })
}

/// `day.month.year` without zero padding, e.g. 2015-03-05 -> `5.3.2015`.
pub fn format_calendar_date(date: NaiveDate) -> String {
    format!("{}.{}.{}", date.day(), date.month(), date.year())
}

pub fn calendar_events_path(from: NaiveDate, to: NaiveDate) -> String {
    format!(
        "/training/getCalendarEvents?start={}&end={}",
        format_calendar_date(from),
        format_calendar_date(to)
    )
}
