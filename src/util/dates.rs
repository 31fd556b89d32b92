//! Inclusive date-range checks over ISO-8601 strings.
//!
//! Windows are whole calendar days. A timestamp bound counts for its entire
//! day, so `2025-06-30T00:00:00Z` as an end bound still admits 30 June.

use chrono::{DateTime, NaiveDate};

use crate::errors::AppError;

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
///
/// Timestamps keep the date of their own offset and drop the time of day;
/// no timezone normalization happens here.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, AppError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    Ok(DateTime::parse_from_rfc3339(value)?.date_naive())
}

/// True iff `date` is neither before `start` nor after `end`.
pub fn is_date_in_range(date: NaiveDate, start: &str, end: &str) -> Result<bool, AppError> {
    let start = parse_iso_date(start)?;
    let end = parse_iso_date(end)?;
    Ok(date >= start && date <= end)
}
