//! Timestamp normalization.
//!
//! Every comparison in the calculator happens on `DateTime<Utc>`, so callers holding
//! ISO 8601 strings from a calendar API go through [`parse_timestamp`] first.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{AvailabilityError, Result};

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts:
/// - RFC 3339 with `Z` or an explicit offset (`2026-03-02T09:00:00-05:00`)
/// - naive local time (`2026-03-02T09:00:00`, optional fractional seconds), read as UTC
/// - a bare date (`2026-03-02`), read as midnight UTC
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ndt.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(ndt.and_utc());
        }
    }

    Err(AvailabilityError::InvalidTimestamp {
        input: input.to_string(),
        reason: "expected RFC 3339, YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD".to_string(),
    })
}

/// Render a UTC instant as RFC 3339 with a `+00:00` offset.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
