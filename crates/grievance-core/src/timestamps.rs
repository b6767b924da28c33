//! Permissive timestamp parsing for status updates.
//!
//! Accepts:
//! - RFC 3339 with timezone: `2024-01-15T10:30:00Z`, `2024-01-15T10:30:00+12:00`
//! - RFC 2822: `Mon, 15 Jan 2024 10:30:00 +0000`
//! - ISO 8601 without timezone (assumes UTC): `2024-01-15T10:30:00`
//! - Fractional seconds: `2024-01-15T10:30:00.123`
//! - Space separator: `2024-01-15 10:30:00`, `2024-01-15 10:30:00Z`
//! - Date only (midnight UTC): `2024-01-15`
//! - Day-first: `15/01/2024`, `15/01/2024 10:30`, `15/01/2024 10:30:00`

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parse a timestamp in any supported format. Returns `None` when nothing matches.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Some clients send a space instead of the `T` separator.
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s.replacen(' ', "T", 1)) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }

    None
}

/// Parse any JSON value or fall back to `now`. Used by the external sync path.
pub fn parse_timestamp_or(value: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    value.and_then(parse_timestamp_value).unwrap_or(now)
}

/// Any JSON value as a timestamp: strings in the supported formats, integers
/// as Unix epoch seconds. Everything else is `None`.
pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

/// A timestamp field on internal update bodies.
///
/// Deserializes from a string in any supported format. An empty string means
/// "clear the field" and an unparseable string is a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampInput {
    Clear,
    At(DateTime<Utc>),
}

impl<'de> Deserialize<'de> for TimestampInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.trim().is_empty() {
            return Ok(TimestampInput::Clear);
        }
        parse_timestamp(&s).map(TimestampInput::At).ok_or_else(|| {
            de::Error::custom(format!(
                "Invalid date format: '{}'. Expected ISO 8601 (e.g., '2024-01-15T10:30:00Z'), \
                 '2024-01-15 10:30:00', '2024-01-15' or '15/01/2024'",
                s
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_rfc3339_utc() {
        let dt = parse_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_offset_converts_to_utc() {
        let dt = parse_timestamp("2024-01-15T22:30:00+12:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc2822() {
        let dt = parse_timestamp("Mon, 15 Jan 2024 10:30:00 +0000").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_naive_assumes_utc() {
        let dt = parse_timestamp("2024-01-15T10:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = parse_timestamp("2024-01-15T10:30:00.123").unwrap();
        assert_eq!(dt.second(), 0);
        assert_eq!(dt.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_parse_space_separated() {
        assert!(parse_timestamp("2024-01-15 10:30:00").is_some());
        assert!(parse_timestamp("2024-01-15 10:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-15 10:30").is_some());
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_timestamp("2024-01-15").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2024, 1, 15, 0));
    }

    #[test]
    fn test_parse_day_first() {
        let dt = parse_timestamp("15/01/2024").unwrap();
        assert_eq!((dt.month(), dt.day()), (1, 15));
        let dt = parse_timestamp("15/01/2024 09:05").unwrap();
        assert_eq!((dt.hour(), dt.minute()), (9, 5));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("yesterday-ish").is_none());
        assert!(parse_timestamp("2024-13-45").is_none());
    }

    #[test]
    fn test_parse_or_falls_back() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp_or(Some(&serde_json::json!("not a date")), now), now);
        assert_eq!(parse_timestamp_or(Some(&serde_json::json!(true)), now), now);
        assert_eq!(parse_timestamp_or(Some(&serde_json::Value::Null), now), now);
        assert_eq!(parse_timestamp_or(None, now), now);
        assert_ne!(parse_timestamp_or(Some(&serde_json::json!("2024-01-15")), now), now);
        assert_ne!(parse_timestamp_or(Some(&serde_json::json!(1705314600)), now), now);
    }

    #[test]
    fn test_timestamp_input_deserialize() {
        let v: TimestampInput = serde_json::from_str("\"\"").unwrap();
        assert_eq!(v, TimestampInput::Clear);
        let v: TimestampInput = serde_json::from_str("\"2024-01-15T10:30:00Z\"").unwrap();
        assert!(matches!(v, TimestampInput::At(_)));
        let err = serde_json::from_str::<TimestampInput>("\"tomorrowish\"").unwrap_err();
        assert!(err.to_string().contains("Invalid date format"));
    }

    #[test]
    fn test_parse_value_epoch_and_junk() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp_value(&serde_json::json!(1705314600)), Some(expected));
        assert_eq!(
            parse_timestamp_value(&serde_json::json!("2024-01-15T10:30:00Z")),
            Some(expected)
        );
        assert_eq!(parse_timestamp_value(&serde_json::json!(true)), None);
        assert_eq!(parse_timestamp_value(&serde_json::json!(1.5)), None);
        assert_eq!(parse_timestamp_value(&serde_json::json!({"at": 1})), None);
    }
}
