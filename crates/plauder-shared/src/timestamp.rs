//! Timestamp parsing for the two formats the chat service emits.
//!
//! Accepts ISO-8601 / RFC-3339 directly, plus the service's legacy
//! `YYYY-MM-DD_HH-MM-SS` pattern (a space is tolerated in place of the
//! underscore). Anything else is unparsable; callers fall back to the
//! numeric-id tie-break for ordering. Parsing never fails loudly.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a message timestamp string to a UTC instant, or `None` if the
/// string matches neither accepted format. Naive timestamps (no offset) are
/// interpreted as UTC.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // ISO-8601 without an offset.
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    // Legacy service format: YYYY-MM-DD_HH-MM-SS (underscore or space).
    for fmt in ["%Y-%m-%d_%H-%M-%S", "%Y-%m-%d %H-%M-%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_rfc3339() {
        let dt = parse_created_at("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(dt.hour(), 10);

        let with_offset = parse_created_at("2024-01-01T12:00:00+02:00").unwrap();
        assert_eq!(with_offset.hour(), 10);
    }

    #[test]
    fn parses_naive_iso() {
        assert!(parse_created_at("2024-06-15T08:30:00").is_some());
        assert!(parse_created_at("2024-06-15T08:30:00.250").is_some());
    }

    #[test]
    fn parses_legacy_service_format() {
        let underscore = parse_created_at("2024-06-15_08-30-00").unwrap();
        let space = parse_created_at("2024-06-15 08-30-00").unwrap();
        assert_eq!(underscore, space);
    }

    #[test]
    fn rejects_garbage_without_panicking() {
        assert_eq!(parse_created_at(""), None);
        assert_eq!(parse_created_at("yesterday"), None);
        assert_eq!(parse_created_at("2024-13-99_99-99-99"), None);
    }
}
