//! # Temporal Casting: Dates and UTC Timestamps
//!
//! Backing functions for [`Caster::date`](crate::Caster::date) and
//! [`Caster::datetime`](crate::Caster::datetime).
//!
//! Both produce normalized strings so that casting is idempotent: a value
//! that went through projection can be cast again and yields the same
//! result.
//!
//! - Dates normalize to ISO 8601 `YYYY-MM-DD`.
//! - Timestamps normalize to UTC with `Z` suffix, truncated to seconds:
//!   `YYYY-MM-DDTHH:MM:SSZ`. Explicit offsets are converted to UTC.

use chrono::{DateTime, NaiveDate, SecondsFormat, Timelike, Utc};

/// Normalized date format.
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Parse `input` with `format` (or the ISO form) into `YYYY-MM-DD`.
pub fn normalize_date(input: &str, format: &str) -> Result<String, String> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, format)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, ISO_DATE))
        .map(|d| d.format(ISO_DATE).to_string())
        .map_err(|e| format!("invalid date {trimmed:?} (expected format {format:?}): {e}"))
}

/// Parse an RFC 3339 timestamp into `YYYY-MM-DDTHH:MM:SSZ`.
pub fn normalize_datetime(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    let parsed = DateTime::parse_from_rfc3339(trimmed)
        .map_err(|e| format!("invalid RFC 3339 timestamp {trimmed:?}: {e}"))?;
    let utc = parsed.with_timezone(&Utc);
    let truncated = utc.with_nanosecond(0).unwrap_or(utc);
    Ok(truncated.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_with_custom_format() {
        assert_eq!(normalize_date("20.11.2015", "%d.%m.%Y").unwrap(), "2015-11-20");
    }

    #[test]
    fn test_date_is_idempotent() {
        let once = normalize_date("20.11.2015", "%d.%m.%Y").unwrap();
        assert_eq!(normalize_date(&once, "%d.%m.%Y").unwrap(), once);
    }

    #[test]
    fn test_date_rejects_garbage() {
        let err = normalize_date("not-a-date", ISO_DATE).unwrap_err();
        assert!(err.contains("not-a-date"));
    }

    #[test]
    fn test_datetime_converts_offsets_and_truncates() {
        assert_eq!(
            normalize_datetime("2026-01-15T17:30:45.123+05:00").unwrap(),
            "2026-01-15T12:30:45Z"
        );
    }

    #[test]
    fn test_datetime_is_idempotent() {
        let once = normalize_datetime("2026-01-15T12:00:00Z").unwrap();
        assert_eq!(normalize_datetime(&once).unwrap(), once);
    }

    #[test]
    fn test_datetime_rejects_naive_input() {
        assert!(normalize_datetime("2026-01-15 12:00:00").is_err());
    }
}
