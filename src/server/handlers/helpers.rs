//! Helper functions for handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::repository::DbError;

/// Leading integer of a query value, the way loosely typed form input is
/// usually read: surrounding whitespace is ignored, an optional sign and the
/// leading digits count, anything else is 0.
pub fn coerce_int(raw: &str) -> i64 {
    let s = raw.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end]
        .parse::<i64>()
        .unwrap_or(if end > 0 { i64::MAX } else { 0 });
    if negative {
        -value
    } else {
        value
    }
}

/// Trimmed, non-empty query value.
pub fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 500 with a JSON `{error}` body.
pub fn store_error(err: DbError) -> Response {
    tracing::error!("Query failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": err.to_string() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int("25"), 25);
        assert_eq!(coerce_int(" 7 "), 7);
        assert_eq!(coerce_int("12abc"), 12);
        assert_eq!(coerce_int("-5"), -5);
        assert_eq!(coerce_int("abc"), 0);
        assert_eq!(coerce_int(""), 0);
        assert_eq!(coerce_int("99999999999999999999"), i64::MAX);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("  rust ".to_string())).as_deref(), Some("rust"));
        assert_eq!(non_empty(&Some("   ".to_string())), None);
        assert_eq!(non_empty(&None), None);
    }
}
