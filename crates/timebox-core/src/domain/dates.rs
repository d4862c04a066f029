//! Date parsing shared by all entities
//!
//! The backend mixes date-only strings (`2025-01-01`), naive timestamps and
//! RFC 3339 timestamps. Everything is parsed into `DateTime<Utc>` on the way
//! in and written back as RFC 3339.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use tracing::debug;

/// Parse any of the date shapes the backend produces
///
/// Returns `None` for empty or unrecognised input.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    debug!(value = raw, "Ignoring unparseable date");
    None
}

/// Format a timestamp the way the backend stores it
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter for optional, loosely formatted dates
///
/// Use with `#[serde(default, with = "crate::domain::dates::lenient")]`.
pub mod lenient {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_some(&super::format_datetime(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_datetime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_only() {
        let dt = parse_datetime("2025-01-01").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2025, 1, 1));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_datetime("2025-03-10T12:00:00-03:00").unwrap();
        assert_eq!(dt.hour(), 15);
    }

    #[test]
    fn test_parse_naive_timestamp() {
        let dt = parse_datetime("2025-03-10T08:30:00.250").unwrap();
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("   ").is_none());
        assert!(parse_datetime("next tuesday").is_none());
    }

    #[test]
    fn test_format_is_rfc3339_millis() {
        let dt = parse_datetime("2025-01-01").unwrap();
        assert_eq!(format_datetime(&dt), "2025-01-01T00:00:00.000Z");
    }
}
