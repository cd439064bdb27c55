//! Raw meter-reading ingestion and cleaning.
//!
//! Raw per-file CSV records are concatenated into one chronologically
//! ordered series, then resampled to a fixed frequency and cleaned.

pub mod ingest;
pub mod resample;

pub use ingest::{read_and_concat, RawSeries};
pub use resample::{resample_and_clean, CleanSeries};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::{PipelineError, Result};

/// Parse a sampling-frequency string (`15T`, `30min`, `1H`, `10S`, `1D`)
/// into a duration.
pub fn parse_freq(freq: &str) -> Result<Duration> {
    let s = freq.trim();
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    let unit = &s[digits.len()..];
    let n: i64 = if digits.is_empty() {
        1
    } else {
        digits
            .parse()
            .map_err(|_| PipelineError::configuration(format!("invalid frequency '{freq}'")))?
    };
    if n <= 0 {
        return Err(PipelineError::configuration(format!(
            "invalid frequency '{freq}'"
        )));
    }
    match unit {
        "T" | "t" | "min" | "Min" => Ok(Duration::minutes(n)),
        "H" | "h" => Ok(Duration::hours(n)),
        "S" | "s" | "sec" => Ok(Duration::seconds(n)),
        "D" | "d" => Ok(Duration::days(n)),
        _ => Err(PipelineError::configuration(format!(
            "unsupported frequency unit in '{freq}'"
        ))),
    }
}

const DATE_FORMATS_DAYFIRST: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];
const DATE_FORMATS_MONTHFIRST: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%Y-%m-%d"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Parse separate date and time strings into a UTC timestamp.
///
/// `dayfirst` selects the ambiguous-format preference (`01/02/2024` as
/// February 1st vs January 2nd). Returns `None` for unparsable input, which
/// callers drop rather than abort on.
pub fn parse_date_time(date: &str, time: &str, dayfirst: bool) -> Option<DateTime<Utc>> {
    let formats = if dayfirst {
        DATE_FORMATS_DAYFIRST
    } else {
        DATE_FORMATS_MONTHFIRST
    };
    let date = date.trim();
    let time = time.trim();
    let d = formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date, f).ok())?;
    let t = TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(time, f).ok())?;
    Some(Utc.from_utc_datetime(&d.and_time(t)))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a combined datetime string (RFC 3339 or a handful of common
/// layouts) into a UTC timestamp.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("15T", 15 * 60)]
    #[case("30min", 30 * 60)]
    #[case("1H", 3600)]
    #[case("H", 3600)]
    #[case("10S", 10)]
    #[case("1D", 86400)]
    fn parses_frequency_strings(#[case] freq: &str, #[case] seconds: i64) {
        assert_eq!(parse_freq(freq).unwrap().num_seconds(), seconds);
    }

    #[rstest]
    #[case("15X")]
    #[case("")]
    #[case("0T")]
    fn rejects_bad_frequencies(#[case] freq: &str) {
        assert!(matches!(
            parse_freq(freq),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn dayfirst_controls_ambiguous_dates() {
        let dayfirst = parse_date_time("01/02/2024", "10:30:00", true).unwrap();
        assert_eq!(dayfirst.to_rfc3339(), "2024-02-01T10:30:00+00:00");

        let monthfirst = parse_date_time("01/02/2024", "10:30:00", false).unwrap();
        assert_eq!(monthfirst.to_rfc3339(), "2024-01-02T10:30:00+00:00");
    }

    #[test]
    fn combined_datetime_formats() {
        assert!(parse_datetime("2024-06-01 12:00:00").is_some());
        assert!(parse_datetime("2024-06-01T12:00:00+00:00").is_some());
        assert!(parse_datetime("garbage").is_none());
    }
}
