//! Date parsing for published dates.
//!
//! Candidate strings are tried against a fixed, ordered list of formats. The
//! first format that parses wins; running out of formats means "no date" and
//! is never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(published|updated|posted|last\s+modified)(\s+on)?\s*:?\s*").expect("DATE_PREFIX_RE regex")
});

static URL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/((?:19|20)\d{2})/(\d{1,2})/(\d{1,2})(?:/|$)").expect("URL_DATE_RE regex"));

/// Date-time layouts without a zone, read as UTC.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Date-only layouts, read as midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

/// Parse a published-date string.
///
/// Tries, in order: RFC 3339, RFC 2822, ISO 8601 with a numeric offset, the
/// zone-less date-time layouts, the date-only layouts and epoch milliseconds.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let value = DATE_PREFIX_RE.replace(raw.trim(), "");
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    parse_epoch(value)
}

/// Epoch milliseconds (12-13 digits) or seconds (9-10 digits).
fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let number: i64 = value.parse().ok()?;
    match value.len() {
        12 | 13 => DateTime::from_timestamp_millis(number),
        9 | 10 => DateTime::from_timestamp(number, 0),
        _ => None,
    }
}

/// Read a `/YYYY/MM/DD/` date out of a URL path.
pub fn date_from_url(url: &str) -> Option<DateTime<Utc>> {
    let caps = URL_DATE_RE.captures(url)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let day = caps.get(3)?.as_str().parse().ok()?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2024-01-15T10:30:00Z", "2024-01-15T10:30:00+00:00")]
    #[case("2024-01-15T10:30:00+02:00", "2024-01-15T08:30:00+00:00")]
    #[case("Mon, 15 Jan 2024 10:30:00 GMT", "2024-01-15T10:30:00+00:00")]
    #[case("2024-01-15T10:30:00+0000", "2024-01-15T10:30:00+00:00")]
    #[case("2024-01-15T10:30:00.250", "2024-01-15T10:30:00.250+00:00")]
    #[case("2024-01-15 10:30:00", "2024-01-15T10:30:00+00:00")]
    #[case("2024-01-15", "2024-01-15T00:00:00+00:00")]
    #[case("2024/01/15", "2024-01-15T00:00:00+00:00")]
    #[case("01/15/2024", "2024-01-15T00:00:00+00:00")]
    #[case("January 15, 2024", "2024-01-15T00:00:00+00:00")]
    #[case("Jan 5, 2024", "2024-01-05T00:00:00+00:00")]
    #[case("15 January 2024", "2024-01-15T00:00:00+00:00")]
    #[case("15 Jan 2024", "2024-01-15T00:00:00+00:00")]
    #[case("1705314600000", "2024-01-15T10:30:00+00:00")]
    #[case("Published on: 2024-01-15", "2024-01-15T00:00:00+00:00")]
    #[case("  Updated 2024-01-15  ", "2024-01-15T00:00:00+00:00")]
    fn test_parse_date_formats(#[case] raw: &str, #[case] expected: &str) {
        let parsed = parse_date(raw).unwrap();
        assert_eq!(parsed, DateTime::parse_from_rfc3339(expected).unwrap().with_timezone(&Utc));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("yesterday")]
    #[case("2024-13-45")]
    #[case("12345")]
    fn test_parse_date_misses(#[case] raw: &str) {
        assert!(parse_date(raw).is_none());
    }

    #[test]
    fn test_date_from_url() {
        let date = date_from_url("https://example.com/2023/07/04/independence-day/").unwrap();
        assert_eq!(date.to_rfc3339(), "2023-07-04T00:00:00+00:00");
    }

    #[test]
    fn test_date_from_url_rejects_invalid() {
        assert!(date_from_url("https://example.com/2023/02/30/bad/").is_none());
        assert!(date_from_url("https://example.com/posts/123").is_none());
    }
}
