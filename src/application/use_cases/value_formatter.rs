//! Date normalization for rendered cells.
//!
//! Dates and timestamps are shown as `DD Mon YYYY` in whatever offset they
//! were stored with; the calendar day is never shifted by a timezone
//! conversion. Text is reformatted only when it parses as one of the
//! recognized date/time layouts, otherwise it passes through untouched.

use crate::domain::query_result::CellValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const DISPLAY_DATE_FORMAT: &str = "%d %b %Y";

/// Naive layouts tried after the zone-aware RFC formats.
const NAIVE_DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d-%b-%y %I.%M.%S%.f %p",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d-%b-%y"];

/// ISO-ish timestamps carrying a numeric offset (`+00`, `+0530`, `-08:00`).
const OFFSET_DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
];

/// HTTP-date style text, e.g. `Tue, 05 Mar 2024 10:15:00 GMT`, with any zone name.
const HTTP_DATE_LAYOUT: &str = "%a, %d %b %Y %H:%M:%S";

fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Layouts without any zone information.
fn parse_naive(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, HTTP_DATE_LAYOUT) {
        return Some(dt.date());
    }
    for layout in NAIVE_DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(dt.date());
        }
    }
    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(text, layout) {
            return Some(date);
        }
    }
    None
}

/// Calendar date encoded in `text`, if it is a recognized date/time string.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.date_naive());
    }
    for layout in OFFSET_DATETIME_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, layout) {
            return Some(dt.date_naive());
        }
    }

    // Zone given as a trailing name (GMT, UTC, CET, ...) that chrono won't take.
    if let Some((head, zone)) = trimmed.rsplit_once(' ') {
        if (1..=5).contains(&zone.len()) && zone.chars().all(|c| c.is_ascii_uppercase()) {
            if let Some(date) = parse_naive(head.trim_end()) {
                return Some(date);
            }
        }
    }
    parse_naive(trimmed)
}

/// Render-ready form of a cell: dates become `DD Mon YYYY`, everything else is kept.
pub fn format_if_date(value: CellValue) -> CellValue {
    match value {
        CellValue::Date(date) => CellValue::Text(format_date(date)),
        CellValue::Timestamp(ts) => CellValue::Text(format_date(ts.date())),
        CellValue::TimestampTz(ts) => CellValue::Text(format_date(ts.date_naive())),
        CellValue::Text(text) => match parse_date_text(&text) {
            Some(date) => CellValue::Text(format_date(date)),
            None => CellValue::Text(text),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(format_if_date(CellValue::Integer(20240305)), CellValue::Integer(20240305));
        assert_eq!(format_if_date(CellValue::Float(1.5)), CellValue::Float(1.5));
        assert_eq!(format_if_date(CellValue::Null), CellValue::Null);
    }

    #[test]
    fn test_typed_dates_are_formatted() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_if_date(CellValue::Date(date)), text("05 Mar 2024"));

        let ts = date.and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(format_if_date(CellValue::Timestamp(ts)), text("05 Mar 2024"));
    }

    #[test]
    fn test_timezone_does_not_shift_the_day() {
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let ts = offset.with_ymd_and_hms(2024, 3, 5, 1, 30, 0).unwrap();
        assert_eq!(format_if_date(CellValue::TimestampTz(ts)), text("05 Mar 2024"));

        assert_eq!(format_if_date(text("2024-03-05T01:30:00+05:30")), text("05 Mar 2024"));
        assert_eq!(format_if_date(text("2024-03-05T23:30:00-08:00")), text("05 Mar 2024"));
    }

    #[test]
    fn test_http_date_strings_any_zone_suffix() {
        assert_eq!(format_if_date(text("Tue, 05 Mar 2024 10:15:00 GMT")), text("05 Mar 2024"));
        assert_eq!(format_if_date(text("Tue, 05 Mar 2024 10:15:00 UTC")), text("05 Mar 2024"));
        assert_eq!(format_if_date(text("Tue, 05 Mar 2024 10:15:00 +0200")), text("05 Mar 2024"));
        assert_eq!(format_if_date(text("2024-03-05 10:15:00 UTC")), text("05 Mar 2024"));
        assert_eq!(format_if_date(text("2024-03-05 10:15:00+00")), text("05 Mar 2024"));
        assert_eq!(format_if_date(text("2024-03-05 23:15:00.250-08:00")), text("05 Mar 2024"));
        assert_eq!(format_if_date(text("2024-03-05 CET")), text("05 Mar 2024"));
    }

    #[test]
    fn test_iso_like_strings() {
        assert_eq!(format_if_date(text("2023-12-31")), text("31 Dec 2023"));
        assert_eq!(format_if_date(text("2023-12-31 08:00:00")), text("31 Dec 2023"));
        assert_eq!(format_if_date(text("2023-12-31T08:00:00.123")), text("31 Dec 2023"));
    }

    #[test]
    fn test_non_dates_unchanged() {
        assert_eq!(format_if_date(text("Aurora")), text("Aurora"));
        assert_eq!(format_if_date(text("IN SERVICE")), text("IN SERVICE"));
        assert_eq!(format_if_date(text("5")), text("5"));
        assert_eq!(format_if_date(text("")), text(""));
        assert_eq!(format_if_date(CellValue::Bool(true)), CellValue::Bool(true));
    }
}
