//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Parse a timestamp string into a UTC datetime.
///
/// Accepts RFC 3339 strings first, then falls back to a naive
/// `YYYY-MM-DDTHH:MM:SS` form (panel payloads use both).
pub fn parse_datetime(value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // Some panels emit expiry as epoch seconds
    if let Ok(epoch) = raw.parse::<i64>() {
        return Some(unix_to_datetime(epoch));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Whole-day difference between two timestamp strings (integer floor).
///
/// Returns `None` when either side is missing or unparseable.
pub fn days_between(old: Option<&str>, new: Option<&str>) -> Option<i64> {
    let old_dt = parse_datetime(old)?;
    let new_dt = parse_datetime(new)?;
    Some((new_dt - old_dt).num_days())
}

/// Convert a unix timestamp to a UTC datetime; out-of-range values clamp
/// to the minimum representable instant.
pub fn unix_to_datetime(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format an optional timestamp string for display, falling back to "Unlimited".
pub fn format_expire(expire: Option<&str>) -> String {
    match parse_datetime(expire) {
        Some(dt) => format_timestamp(dt),
        None => "Unlimited".to_string(),
    }
}

/// Truncate text to a maximum number of characters with an ellipsis marker.
///
/// Operates on character boundaries, never byte offsets.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_rfc3339() {
        let parsed = parse_datetime(Some("2025-03-01T12:00:00Z")).unwrap();
        assert_eq!(parsed.timestamp(), 1740830400);
    }

    #[test]
    fn test_parse_datetime_naive() {
        assert!(parse_datetime(Some("2025-03-01T12:00:00")).is_some());
        assert!(parse_datetime(Some("2025-03-01 12:00:00")).is_some());
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime(None).is_none());
        assert!(parse_datetime(Some("")).is_none());
        assert!(parse_datetime(Some("not-a-date")).is_none());
    }

    #[test]
    fn test_days_between_floor() {
        // 9 days and 23 hours floors to 9
        let old = Some("2025-01-01T00:00:00Z");
        let new = Some("2025-01-10T23:00:00Z");
        assert_eq!(days_between(old, new), Some(9));
    }

    #[test]
    fn test_days_between_missing_side() {
        assert_eq!(days_between(None, Some("2025-01-10T00:00:00Z")), None);
        assert_eq!(days_between(Some("garbage"), Some("2025-01-10T00:00:00Z")), None);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_text_multibyte() {
        let text = "наплыв".repeat(10);
        let truncated = truncate_text(&text, 20);
        assert!(truncated.chars().count() <= 20);
        assert!(truncated.ends_with("..."));
    }
}
