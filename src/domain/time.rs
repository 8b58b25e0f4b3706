//! Timestamp helpers.
//!
//! Stored timestamps are RFC 3339 UTC strings with millisecond precision, so
//! lexical comparison in the store matches chronological order.

use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};

/// Formats a timestamp in the stored representation.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the stored representation.
#[must_use]
pub fn now() -> String {
    format_timestamp(Utc::now())
}

/// Midnight (UTC) at the start of the given instant's day.
#[must_use]
pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(format_timestamp(later), "2026-01-10T00:00:00.000Z");
    }

    #[test]
    fn start_of_day_truncates_time() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 17, 45, 3).unwrap();
        assert_eq!(
            start_of_day(at),
            Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap()
        );
    }
}
