//! Timestamp utilities
//!
//! CMS datetime fields arrive either as RFC 3339 timestamps or as naive
//! `YYYY-MM-DDTHH:MM:SS` values; naive values are read as UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::Serializer;

/// Parse a CMS datetime, date-only values map to midnight UTC
pub fn parse_cms_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// 00:00:00.000 of the given instant's UTC day
pub fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 of the given instant's UTC day
pub fn end_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(instant) + Duration::days(1) - Duration::milliseconds(1)
}

/// ISO 8601 with millisecond precision and a `Z` suffix
pub fn to_iso_millis(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Long English date, e.g. `March 7, 2025`
pub fn format_long_date(instant: DateTime<Utc>) -> String {
    instant.format("%B %-d, %Y").to_string()
}

/// Serde adapter writing timestamps with [`to_iso_millis`]
pub fn serialize_iso_millis<S: Serializer>(
    instant: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_iso_millis(*instant))
}
