//! ISO-8601 rendering and recognition for date and time leaves.
//!
//! Dates render as `YYYY-MM-DD`, times as `HH:MM:SS` with a fractional part
//! only when it is non-zero, and datetimes join the two with `T` followed by
//! an optional `±HH:MM` offset.
//!
//! The parsers accept exactly those shapes plus `HH:MM` times, a space as
//! the date/time separator, and `Z` as the UTC offset.
//!
//! ```rust
//! use config_formats::datetime::{parse_date, parse_time, parse_datetime};
//!
//! assert!(parse_date("2020-02-20").is_some());
//! assert!(parse_time("12:34:56").is_some());
//! assert!(parse_datetime("2020-02-20T12:34:56+01:00").is_some());
//! assert!(parse_date("2020-2-20").is_none());
//! ```

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// A calendar date with a wall-clock time and an optional UTC offset.
///
/// Formats such as TOML distinguish offset datetimes from local ones, so the
/// offset is kept separately instead of forcing everything into UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub datetime: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl Timestamp {
    /// A local datetime without offset.
    #[must_use]
    pub const fn local(datetime: NaiveDateTime) -> Self {
        Timestamp {
            datetime,
            offset: None,
        }
    }

    /// A datetime at the given UTC offset.
    #[must_use]
    pub const fn with_offset(datetime: NaiveDateTime, offset: FixedOffset) -> Self {
        Timestamp {
            datetime,
            offset: Some(offset),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}T{}",
            format_date(&self.datetime.date()),
            format_time(&self.datetime.time())
        )?;
        if let Some(offset) = self.offset {
            let seconds = offset.local_minus_utc();
            let sign = if seconds < 0 { '-' } else { '+' };
            let seconds = seconds.unsigned_abs();
            write!(f, "{}{:02}:{:02}", sign, seconds / 3600, (seconds % 3600) / 60)?;
        }
        Ok(())
    }
}

/// Renders a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Renders a time as `HH:MM:SS`, adding microseconds or nanoseconds only
/// when the fraction is non-zero.
#[must_use]
pub fn format_time(time: &NaiveTime) -> String {
    let nanos = time.nanosecond();
    if nanos == 0 {
        time.format("%H:%M:%S").to_string()
    } else if nanos % 1_000 == 0 {
        time.format("%H:%M:%S%.6f").to_string()
    } else {
        time.format("%H:%M:%S%.9f").to_string()
    }
}

fn digits(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        bytes
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0')),
    )
}

/// Parses a `YYYY-MM-DD` date.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    let year = digits(&b[0..4])?;
    let month = digits(&b[5..7])?;
    let day = digits(&b[8..10])?;
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

/// Parses an `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fraction` time.
#[must_use]
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let (clock, fraction) = match s.split_once('.') {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (s, None),
    };
    let b = clock.as_bytes();
    let (hour, minute, second) = match b.len() {
        5 if b[2] == b':' => (digits(&b[0..2])?, digits(&b[3..5])?, 0),
        8 if b[2] == b':' && b[5] == b':' => {
            (digits(&b[0..2])?, digits(&b[3..5])?, digits(&b[6..8])?)
        }
        _ => return None,
    };
    let nanos = match fraction {
        None => 0,
        // a fraction needs seconds in front of it
        Some(_) if b.len() != 8 => return None,
        Some(fraction) => {
            let f = fraction.as_bytes();
            if f.len() > 9 {
                return None;
            }
            digits(f)? * 10u32.pow(9 - f.len() as u32)
        }
    };
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s == "Z" || s == "z" {
        return FixedOffset::east_opt(0);
    }
    let b = s.as_bytes();
    if b.len() != 6 || b[3] != b':' {
        return None;
    }
    let seconds = i32::try_from(digits(&b[1..3])? * 3600 + digits(&b[4..6])? * 60).ok()?;
    match b[0] {
        b'+' => FixedOffset::east_opt(seconds),
        b'-' => FixedOffset::west_opt(seconds),
        _ => None,
    }
}

/// Parses a date and time separated by `T` or a space, with an optional
/// `Z` or `±HH:MM` offset.
#[must_use]
pub fn parse_datetime(s: &str) -> Option<Timestamp> {
    if s.len() < 16 || !s.is_char_boundary(10) {
        return None;
    }
    let (date, rest) = s.split_at(10);
    let date = parse_date(date)?;
    let rest = rest
        .strip_prefix('T')
        .or_else(|| rest.strip_prefix('t'))
        .or_else(|| rest.strip_prefix(' '))?;

    let offset_at = rest
        .find(|c| matches!(c, 'Z' | 'z' | '+' | '-'))
        .unwrap_or(rest.len());
    let (time, offset) = rest.split_at(offset_at);
    let datetime = date.and_time(parse_time(time)?);
    if offset.is_empty() {
        Some(Timestamp::local(datetime))
    } else {
        Some(Timestamp::with_offset(datetime, parse_offset(offset)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2020-02-20"), NaiveDate::from_ymd_opt(2020, 2, 20));
        assert_eq!(parse_date("2020-02-30"), None);
        assert_eq!(parse_date("20200220"), None);
        assert_eq!(parse_date("2020-02-20T12:34:56"), None);
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("12:34:56"), NaiveTime::from_hms_opt(12, 34, 56));
        assert_eq!(parse_time("21:00"), NaiveTime::from_hms_opt(21, 0, 0));
        assert_eq!(
            parse_time("12:34:56.5"),
            NaiveTime::from_hms_milli_opt(12, 34, 56, 500)
        );
        assert_eq!(parse_time("12:34.5"), None);
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("1234"), None);
    }

    #[test]
    fn test_parse_datetime_local_and_offset() {
        let local = parse_datetime("2020-02-20T12:34:56").unwrap();
        assert_eq!(local.offset, None);
        assert_eq!(local.to_string(), "2020-02-20T12:34:56");

        let utc = parse_datetime("2020-02-20 12:34:56Z").unwrap();
        assert_eq!(utc.offset, FixedOffset::east_opt(0));
        assert_eq!(utc.to_string(), "2020-02-20T12:34:56+00:00");

        let west = parse_datetime("2020-02-20T12:34:56.250-05:30").unwrap();
        assert_eq!(west.to_string(), "2020-02-20T12:34:56.250000-05:30");

        assert_eq!(parse_datetime("2020-02-20X12:34:56"), None);
        assert_eq!(parse_datetime("2020-02-20T12:34:56+1"), None);
    }

    #[test]
    fn test_format_time_fraction() {
        let t = NaiveTime::from_hms_nano_opt(1, 2, 3, 7).unwrap();
        assert_eq!(format_time(&t), "01:02:03.000000007");
        let t = NaiveTime::from_hms_opt(21, 0, 0).unwrap();
        assert_eq!(format_time(&t), "21:00:00");
    }
}
