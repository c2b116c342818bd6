//! Permissive timestamp parsing.
//!
//! Job boards publish dates in every format imaginable. Everything is
//! parsed into UTC and re-emitted in one canonical ISO-8601 form so that
//! stored `posted_at` values sort lexicographically.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Formats carrying an explicit offset that RFC 3339 parsing rejects.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Formats without an offset, taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Epoch values at or above this magnitude are milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Parse a timestamp in any of the supported formats.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(from_epoch);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Interpret an epoch number as seconds, or milliseconds when it is too
/// large to be seconds.
pub fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.unsigned_abs() >= MILLIS_THRESHOLD.unsigned_abs() {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

/// Canonical form: `YYYY-MM-DDTHH:MM:SS+00:00`.
pub fn to_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse and re-emit in canonical form, or `None` if unparseable.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(to_iso)
}

/// Normalize a JSON value holding either a date string or an epoch number.
pub fn normalize_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => normalize_timestamp(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch)
            .map(to_iso),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_formats() {
        let expected = Some("2024-03-05T14:30:00+00:00".to_string());
        assert_eq!(normalize_timestamp("2024-03-05T14:30:00Z"), expected);
        assert_eq!(normalize_timestamp("2024-03-05T16:30:00+02:00"), expected);
        assert_eq!(normalize_timestamp("Tue, 05 Mar 2024 14:30:00 GMT"), expected);
        assert_eq!(normalize_timestamp("Tue, 05 Mar 2024 14:30:00 +0000"), expected);
        assert_eq!(normalize_timestamp("2024-03-05 14:30:00"), expected);
        assert_eq!(normalize_timestamp("2024-03-05T14:30:00.000+0000"), expected);
        assert_eq!(normalize_timestamp("1709649000"), expected);
        assert_eq!(normalize_timestamp("1709649000000"), expected);
        assert_eq!(
            normalize_timestamp("2024-03-05"),
            Some("2024-03-05T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(normalize_timestamp(""), None);
        assert_eq!(normalize_timestamp("yesterday-ish"), None);
        assert_eq!(normalize_value(&Value::Null), None);
        assert_eq!(normalize_value(&serde_json::json!(["2024-03-05"])), None);
    }

    #[test]
    fn test_json_numbers() {
        assert_eq!(
            normalize_value(&serde_json::json!(1709649000)),
            Some("2024-03-05T14:30:00+00:00".to_string())
        );
        assert_eq!(
            normalize_value(&serde_json::json!(1709649000000_i64)),
            Some("2024-03-05T14:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_out_of_range_numbers() {
        assert_eq!(normalize_value(&serde_json::json!(i64::MIN)), None);
        assert_eq!(normalize_value(&serde_json::json!(i64::MAX)), None);
        assert_eq!(normalize_value(&serde_json::json!(-1e300)), None);
        assert_eq!(from_epoch(i64::MIN), None);
    }
}
