//! Front matter date parsing.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Parse RFC 3339 (`2024-01-02T10:00:00+02:00`), local datetime
/// (`2024-01-02T10:00:00` or with a space) or plain date (`2024-01-02`).
/// Offset-less values are taken as UTC.
pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        let dt = parse_date("2024-03-05").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-05T00:00:00+00:00");
    }

    #[test]
    fn test_parse_rfc3339_keeps_offset() {
        let dt = parse_date("2024-03-05T10:30:00+02:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_parse_local_datetime() {
        assert!(parse_date("2024-03-05T10:30:00").is_some());
        assert!(parse_date("2024-03-05 10:30:00").is_some());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_date("2024-13-45").is_none());
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("").is_none());
    }
}
