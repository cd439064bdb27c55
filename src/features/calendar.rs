//! Calendar features derived deterministically from the timestamp index.

use chrono::{DateTime, Datelike, Timelike, Utc};

pub const CALENDAR_COLUMNS: [&str; 5] = ["hour", "dayofweek", "day", "month", "weekofyear"];

/// Calendar feature values for one timestamp, in `CALENDAR_COLUMNS` order.
/// Day-of-week is 0 = Monday, matching the rest of the pipeline.
pub fn calendar_row(ts: DateTime<Utc>) -> [f64; 5] {
    [
        ts.hour() as f64,
        ts.weekday().num_days_from_monday() as f64,
        ts.day() as f64,
        ts.month() as f64,
        ts.iso_week().week() as f64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn known_timestamp() {
        // 2024-06-03 is a Monday, ISO week 23
        let ts = Utc.with_ymd_and_hms(2024, 6, 3, 14, 30, 0).unwrap();
        assert_eq!(calendar_row(ts), [14.0, 0.0, 3.0, 6.0, 23.0]);
    }

    #[test]
    fn weekend_day_of_week() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 8, 0, 0, 0).unwrap(); // Saturday
        assert_eq!(calendar_row(ts)[1], 5.0);
    }
}
