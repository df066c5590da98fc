//! Strict RFC 1123 timestamp parsing for RSS `pubDate` values.
//!
//! Accepts exactly the `Mon, 02 Jan 2006 15:04:05 MST` layout. Anything
//! looser (single-digit days, numeric offsets, missing seconds) is rejected
//! so the caller can skip the item.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Length of `Mon, 02 Jan 2006 15:04:05`, the part before the zone name
const STAMP_LEN: usize = 25;

/// Character classes of the stamp: `a` letter, `0` digit, anything else literal
const STAMP_SHAPE: &[u8; STAMP_LEN] = b"aaa, 00 aaa 0000 00:00:00";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Errors produced when a `pubDate` does not match the RFC 1123 layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("Timestamp does not match RFC 1123 layout: {0:?}")]
    Layout(String),

    #[error("Unsupported time zone {0:?}")]
    Zone(String),
}

/// Parses an RFC 1123 timestamp into UTC.
///
/// Weekday and month names match regardless of case. The weekday must be a
/// valid abbreviation but is not checked against the date. Zone names must
/// be uppercase: RFC 822 names map to their offsets and any other uppercase
/// abbreviation is read as UTC.
///
/// # Examples
///
/// ```
/// use feedpump::feed::parse_rfc1123;
///
/// let ts = parse_rfc1123("Mon, 02 Jan 2006 15:04:05 GMT").unwrap();
/// assert_eq!(ts.timestamp(), 1136214245);
///
/// assert!(parse_rfc1123("Mon, 02 Jan 2006 15:04:05 +0000").is_err());
/// assert!(parse_rfc1123("not-a-date").is_err());
/// ```
pub fn parse_rfc1123(raw: &str) -> Result<DateTime<Utc>, DateError> {
    let trimmed = raw.trim();
    let layout_err = || DateError::Layout(trimmed.to_string());

    let (stamp, zone) = trimmed.rsplit_once(' ').ok_or_else(layout_err)?;
    if stamp.len() != STAMP_LEN || !stamp.is_ascii() {
        return Err(layout_err());
    }

    let (weekday, rest) = stamp.split_at(3);
    if !WEEKDAYS.iter().any(|day| day.eq_ignore_ascii_case(weekday)) || !rest.starts_with(", ") {
        return Err(layout_err());
    }
    // chrono tolerates space-padded numbers; the layout does not
    if !matches_shape(stamp) {
        return Err(layout_err());
    }
    // %b matches month names case-insensitively, like the weekday check above

    let naive = NaiveDateTime::parse_from_str(&rest[2..], "%d %b %Y %H:%M:%S")
        .map_err(|_| layout_err())?;

    let offset = zone_offset(zone)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(layout_err)
}

fn matches_shape(stamp: &str) -> bool {
    stamp
        .bytes()
        .zip(STAMP_SHAPE.iter())
        .all(|(b, &class)| match class {
            b'a' => b.is_ascii_alphabetic(),
            b'0' => b.is_ascii_digit(),
            literal => b == literal,
        })
}

/// Maps an RFC 822 zone name to its UTC offset.
fn zone_offset(zone: &str) -> Result<FixedOffset, DateError> {
    let hours = match zone {
        "UT" | "UTC" | "GMT" | "Z" => 0,
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        other
            if (1..=5).contains(&other.len())
                && other.bytes().all(|b| b.is_ascii_uppercase()) =>
        {
            tracing::trace!(zone = %other, "Unknown zone abbreviation, treating as UTC");
            0
        }
        other => return Err(DateError::Zone(other.to_string())),
    };
    FixedOffset::east_opt(hours * 3600).ok_or_else(|| DateError::Zone(zone.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parses_reference_layout() {
        let ts = parse_rfc1123("Mon, 02 Jan 2006 15:04:05 GMT").unwrap();
        assert_eq!(ts.to_rfc3339(), "2006-01-02T15:04:05+00:00");
    }

    #[test]
    fn test_applies_rfc822_zone_offsets() {
        let mst = parse_rfc1123("Mon, 02 Jan 2006 15:04:05 MST").unwrap();
        assert_eq!(mst.to_rfc3339(), "2006-01-02T22:04:05+00:00");

        let edt = parse_rfc1123("Tue, 10 Jun 2003 04:00:00 EDT").unwrap();
        assert_eq!(edt.to_rfc3339(), "2003-06-10T08:00:00+00:00");
    }

    #[test]
    fn test_unknown_abbreviation_is_utc() {
        let ts = parse_rfc1123("Mon, 02 Jan 2006 15:04:05 CEST").unwrap();
        assert_eq!(ts.to_rfc3339(), "2006-01-02T15:04:05+00:00");
    }

    #[test]
    fn test_lowercase_zone_rejected() {
        for zone in ["est", "gmt", "Est", "cest"] {
            let input = format!("Mon, 02 Jan 2006 15:04:05 {zone}");
            assert_eq!(
                parse_rfc1123(&input),
                Err(DateError::Zone(zone.to_string())),
                "expected zone error for {input:?}"
            );
        }
    }

    #[test]
    fn test_day_and_month_names_ignore_case() {
        let canonical = parse_rfc1123("Mon, 02 Jan 2006 15:04:05 EST").unwrap();
        for input in [
            "mon, 02 Jan 2006 15:04:05 EST",
            "Mon, 02 jan 2006 15:04:05 EST",
            "MON, 02 JAN 2006 15:04:05 EST",
        ] {
            assert_eq!(parse_rfc1123(input), Ok(canonical), "for {input:?}");
        }
    }

    #[test]
    fn test_weekday_not_cross_checked() {
        // 2006-01-02 was a Monday; a wrong weekday name is still accepted
        assert!(parse_rfc1123("Fri, 02 Jan 2006 15:04:05 GMT").is_ok());
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert!(parse_rfc1123("\n   Mon, 02 Jan 2006 15:04:05 GMT  \n").is_ok());
    }

    #[test]
    fn test_rejects_loose_layouts() {
        let rejects = [
            "not-a-date",
            "",
            "Mon, 2 Jan 2006 15:04:05 GMT",
            "Mon,  2 Jan 2006 15:04:05 GMT",
            "Mon, 02 Jan 2006 15:04 GMT",
            "Mon, 02 Jan 06 15:04:05 GMT",
            "Monday, 02 Jan 2006 15:04:05 GMT",
            "Xyz, 02 Jan 2006 15:04:05 GMT",
            "Mon 02 Jan 2006 15:04:05 GMT",
            "Mon, 02 Foo 2006 15:04:05 GMT",
            "Mon, 32 Jan 2006 15:04:05 GMT",
            "Mon, 02 Jan 2006 25:04:05 GMT",
            "Mon, 02 Jan 2006  5:04:05 GMT",
            "2006-01-02T15:04:05Z",
        ];
        for input in rejects {
            assert!(
                matches!(parse_rfc1123(input), Err(DateError::Layout(_))),
                "expected layout error for {input:?}"
            );
        }
    }

    #[test]
    fn test_rejects_numeric_offsets() {
        assert_eq!(
            parse_rfc1123("Mon, 02 Jan 2006 15:04:05 +0000"),
            Err(DateError::Zone("+0000".to_string()))
        );
    }

    proptest! {
        #[test]
        fn prop_formatted_utc_timestamps_parse(secs in 0i64..4_102_444_800) {
            let dt = Utc.timestamp_opt(secs, 0).unwrap();
            let formatted = dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
            let parsed = parse_rfc1123(&formatted).unwrap();
            prop_assert_eq!(parsed, dt);
        }

        #[test]
        fn prop_never_panics(input in "\\PC*") {
            let _ = parse_rfc1123(&input);
        }
    }
}
