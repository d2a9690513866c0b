//! Timestamp normalization.
//!
//! Stored timestamps arrive in several layouts (RFC 3339 written by the
//! core, `datetime('now')` defaults written by SQLite, bare dates entered
//! by caregivers). Every one of them is parsed into a single canonical
//! instant, `DateTime<Utc>`, and written back out in one canonical layout.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Canonical instant type used throughout the crate.
pub type Instant = DateTime<Utc>;

/// Timestamp parse errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    #[error("empty timestamp")]
    Empty,

    #[error("unrecognized timestamp {value:?}: {reason}")]
    Unrecognized { value: String, reason: String },
}

pub type TimeResult<T> = Result<T, TimeError>;

/// Accepted input layouts, tried in order.
#[derive(Debug, Clone, Copy)]
enum Layout {
    /// RFC 3339 with optional fractional seconds (`2024-01-03T08:00:00.5Z`).
    Rfc3339,
    /// SQLite `datetime()` output, interpreted as UTC.
    DateTime(&'static str),
    /// Calendar date, interpreted as midnight UTC.
    Date(&'static str),
}

const LAYOUTS: &[Layout] = &[
    Layout::Rfc3339,
    Layout::DateTime("%Y-%m-%d %H:%M:%S"),
    Layout::Date("%Y-%m-%d"),
];

impl Layout {
    fn parse(self, value: &str) -> Result<Instant, chrono::ParseError> {
        match self {
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(value).map(|t| t.with_timezone(&Utc)),
            Layout::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt).map(|t| t.and_utc()),
            Layout::Date(fmt) => NaiveDate::parse_from_str(value, fmt)
                .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc()),
        }
    }
}

/// Parse a stored timestamp into a canonical instant.
///
/// Surrounding whitespace is ignored. The first layout that accepts the
/// input wins; offsets other than UTC are converted.
pub fn parse_instant(text: &str) -> TimeResult<Instant> {
    let value = text.trim();
    if value.is_empty() {
        return Err(TimeError::Empty);
    }

    let mut last_err = None;
    for layout in LAYOUTS {
        match layout.parse(value) {
            Ok(instant) => return Ok(instant),
            Err(e) => last_err = Some(e),
        }
    }

    Err(TimeError::Unrecognized {
        value: value.to_string(),
        reason: last_err.map(|e| e.to_string()).unwrap_or_default(),
    })
}

/// Parse a nullable stored timestamp.
///
/// `None` and blank strings are both absent; anything else must parse.
pub fn parse_optional_instant(text: Option<&str>) -> TimeResult<Option<Instant>> {
    match text {
        Some(value) if !value.trim().is_empty() => parse_instant(value).map(Some),
        _ => Ok(None),
    }
}

/// Format an instant in the canonical wire layout: UTC, nine fractional
/// digits, `Z` suffix.
///
/// The width is fixed, so formatted instants within four-digit years sort
/// lexicographically in chronological order.
pub fn format_instant(instant: &Instant) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Format a nullable instant. Absent stays absent, never an empty string.
pub fn format_optional_instant(instant: Option<&Instant>) -> Option<String> {
    instant.map(format_instant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Instant {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_parse_rfc3339_nano() {
        let t = parse_instant("2024-01-03T08:00:00.123456789Z").unwrap();
        assert_eq!(t.timestamp_subsec_nanos(), 123_456_789);
        assert_eq!(t.timestamp(), utc(2024, 1, 3, 8, 0, 0).timestamp());
    }

    #[test]
    fn test_parse_rfc3339_with_offset_normalizes_to_utc() {
        let t = parse_instant("2024-01-03T10:00:00+02:00").unwrap();
        assert_eq!(t, utc(2024, 1, 3, 8, 0, 0));
    }

    #[test]
    fn test_parse_sqlite_datetime() {
        let t = parse_instant("2024-01-03 08:00:00").unwrap();
        assert_eq!(t, utc(2024, 1, 3, 8, 0, 0));
    }

    #[test]
    fn test_parse_date_only() {
        let t = parse_instant("2024-01-03").unwrap();
        assert_eq!(t, utc(2024, 1, 3, 0, 0, 0));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let t = parse_instant("  2024-01-03 08:00:00\n").unwrap();
        assert_eq!(t, utc(2024, 1, 3, 8, 0, 0));
    }

    #[test]
    fn test_parse_empty_fails() {
        assert_eq!(parse_instant(""), Err(TimeError::Empty));
        assert_eq!(parse_instant("   "), Err(TimeError::Empty));
    }

    #[test]
    fn test_parse_garbage_fails() {
        let err = parse_instant("next tuesday").unwrap_err();
        assert!(matches!(err, TimeError::Unrecognized { .. }));
        assert!(parse_instant("2024-13-40").is_err());
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(parse_optional_instant(None).unwrap(), None);
        assert_eq!(parse_optional_instant(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_optional_instant(Some("2024-01-03")).unwrap(),
            Some(utc(2024, 1, 3, 0, 0, 0))
        );
        assert!(parse_optional_instant(Some("not a date")).is_err());
    }

    #[test]
    fn test_format_is_fixed_width_utc() {
        let t = utc(2024, 1, 3, 8, 0, 0);
        assert_eq!(format_instant(&t), "2024-01-03T08:00:00.000000000Z");
    }

    #[test]
    fn test_format_optional_keeps_absent() {
        assert_eq!(format_optional_instant(None), None);
        let t = utc(2024, 1, 3, 8, 0, 0);
        assert_eq!(
            format_optional_instant(Some(&t)).as_deref(),
            Some("2024-01-03T08:00:00.000000000Z")
        );
    }

    #[test]
    fn test_formatted_instants_sort_chronologically() {
        let earlier = utc(2024, 1, 3, 8, 0, 0);
        let later = earlier + chrono::Duration::milliseconds(500);
        assert!(format_instant(&earlier) < format_instant(&later));
    }

    fn any_instant() -> impl Strategy<Value = Instant> {
        // 1970-01-01 .. 2100-01-01
        (0i64..4_102_444_800, 0u32..1_000_000_000)
            .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
    }

    proptest! {
        #[test]
        fn prop_round_trip_canonical(t in any_instant()) {
            let text = format_instant(&t);
            prop_assert_eq!(parse_instant(&text).unwrap(), t);
        }

        #[test]
        fn prop_round_trip_every_layout(t in any_instant()) {
            let whole = Utc.timestamp_opt(t.timestamp(), 0).unwrap();
            let inputs = [
                t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                whole.to_rfc3339_opts(SecondsFormat::Secs, false),
                whole.format("%Y-%m-%d %H:%M:%S").to_string(),
                whole.format("%Y-%m-%d").to_string(),
            ];
            for input in inputs {
                let first = parse_instant(&input).unwrap();
                let second = parse_instant(&format_instant(&first)).unwrap();
                prop_assert_eq!(first, second);
            }
        }
    }
}
