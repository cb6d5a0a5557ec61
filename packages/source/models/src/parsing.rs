//! Timestamp and coordinate parsing for provider values.
//!
//! Timestamps are kept as civil (zone-less) date-times. Socrata "floating
//! timestamp" columns such as `created_date` carry no offset and are
//! interpreted as New York local time by the provider; no conversion is
//! applied anywhere in this workspace.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Format used for SoQL timestamp literals (`2024-01-15T14:30:00`).
pub const SOQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a provider timestamp (ISO 8601, optional fractional seconds).
///
/// Values carrying an explicit offset keep their wall-clock reading. A bare
/// date is read as midnight.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, SOQL_TIMESTAMP_FORMAT) {
        return Some(naive);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}

/// Formats a civil timestamp as a SoQL literal (no zone, no fraction).
#[must_use]
pub fn format_soql_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(SOQL_TIMESTAMP_FORMAT).to_string()
}

/// Parses lat/lng from optional string fields. Returns `None` if missing,
/// unparseable, or zero.
#[must_use]
pub fn parse_lat_lng(lat: Option<&str>, lng: Option<&str>) -> Option<(f64, f64)> {
    let latitude = lat?.trim().parse::<f64>().ok()?;
    let longitude = lng?.trim().parse::<f64>().ok()?;
    if latitude == 0.0 || longitude == 0.0 || !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    Some((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use chrono::Timelike as _;

    use super::*;

    #[test]
    fn parses_timestamp_with_fractional() {
        let dt = parse_timestamp("2024-01-15T14:30:00.000").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 14:30:00");
    }

    #[test]
    fn parses_timestamp_without_fractional() {
        let dt = parse_timestamp("2024-01-15T14:30:00").unwrap();
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn keeps_wall_clock_of_offset_timestamps() {
        let dt = parse_timestamp("2024-01-15T23:10:00-05:00").unwrap();
        assert_eq!(dt.hour(), 23);
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        let dt = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn rejects_invalid_timestamp() {
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2024-13-45T99:00:00").is_none());
    }

    #[test]
    fn formats_soql_literal() {
        let dt = parse_timestamp("2024-01-15T14:30:00.250").unwrap();
        assert_eq!(format_soql_timestamp(&dt), "2024-01-15T14:30:00");
    }

    #[test]
    fn rejects_zero_or_garbage_lat_lng() {
        assert!(parse_lat_lng(Some("0.0"), Some("-73.9")).is_none());
        assert!(parse_lat_lng(Some("abc"), Some("-73.9")).is_none());
        assert!(parse_lat_lng(None, Some("-73.9")).is_none());
        assert!(parse_lat_lng(Some("NaN"), Some("-73.9")).is_none());
    }
}
