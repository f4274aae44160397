use chrono::{DateTime, Duration, NaiveDate, Utc};

// Parse a window string like "5d", "YYYY-MM-DD", or RFC3339 into a UTC timestamp.
// Relative windows are anchored at `now` so callers can inject the clock.
pub fn parse_window_str(s: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    // "5d" -> now - 5 days
    if let Some(stripped) = s.strip_suffix('d') {
        if let Ok(days) = stripped.parse::<i64>() {
            if days > 0 {
                return Some(now - Duration::days(days));
            }
        }
    }
    // "YYYY-MM-DD"
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = nd.and_hms_opt(0, 0, 0) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc));
        }
    }
    // RFC3339
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

// Specific name used by gc for older_than/cutoff parsing
pub fn parse_cutoff_str(s: &str) -> Option<DateTime<Utc>> {
    parse_window_str(s, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_window_is_anchored_at_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let ts = parse_window_str("5d", now).unwrap();
        assert_eq!(ts, now - Duration::days(5));
    }

    #[test]
    fn date_and_rfc3339_forms_parse() {
        let now = Utc::now();
        let day = parse_window_str("2025-06-01", now).unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let ts = parse_window_str("2025-06-01T08:30:00Z", now).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap());
    }

    #[test]
    fn junk_and_non_positive_windows_are_rejected() {
        let now = Utc::now();
        assert!(parse_window_str("yesterday", now).is_none());
        assert!(parse_window_str("0d", now).is_none());
        assert!(parse_window_str("-3d", now).is_none());
    }
}
