//! Date/time utilities for gator.
//!
//! Feed producers write publish dates in many layouts. [`parse_pub_date`]
//! tries a fixed, ordered list of them and returns the first match as a UTC
//! instant. The same module parses aggregation intervals ("30s", "1h30m")
//! and converts timestamps to and from their stored text form.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::{GatorError, Result};

/// A publish-date layout.
#[derive(Debug, Clone, Copy)]
enum Layout {
    /// RFC 3339, with or without fractional seconds.
    Rfc3339,
    /// A chrono format that includes a numeric zone (`%z`).
    Offset(&'static str),
    /// A chrono format without zone; the zone abbreviation is the
    /// whitespace-separated token at `zone_at`.
    Named {
        format: &'static str,
        zone_at: usize,
    },
    /// A chrono format without any zone, read as UTC.
    Naive(&'static str),
}

/// Leading day-name token a layout expects.
///
/// The token must be a well-formed day name but is otherwise ignored, so
/// a date whose weekday disagrees with its calendar date still parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayName {
    None,
    /// `Mon`
    Short,
    /// `Mon,`
    ShortComma,
    /// `Monday,`
    LongComma,
}

/// Known layouts, in the order they are attempted.
const LAYOUTS: &[(&str, DayName, Layout)] = &[
    // Mon, 02 Jan 2006 15:04:05 -0700
    (
        "RFC1123Z",
        DayName::ShortComma,
        Layout::Offset("%d %b %Y %H:%M:%S %z"),
    ),
    // 2006-01-02T15:04:05.999999999Z07:00 and 2006-01-02T15:04:05Z07:00
    ("RFC3339", DayName::None, Layout::Rfc3339),
    // Mon, 02 Jan 2006 15:04:05 MST
    (
        "RFC1123",
        DayName::ShortComma,
        Layout::Named {
            format: "%d %b %Y %H:%M:%S",
            zone_at: 4,
        },
    ),
    // Monday, 02-Jan-06 15:04:05 MST
    (
        "RFC850",
        DayName::LongComma,
        Layout::Named {
            format: "%d-%b-%y %H:%M:%S",
            zone_at: 2,
        },
    ),
    // 02 Jan 06 15:04 -0700
    ("RFC822Z", DayName::None, Layout::Offset("%d %b %y %H:%M %z")),
    // 02 Jan 06 15:04 MST
    (
        "RFC822",
        DayName::None,
        Layout::Named {
            format: "%d %b %y %H:%M",
            zone_at: 4,
        },
    ),
    // Mon Jan 02 15:04:05 -0700 2006
    (
        "RubyDate",
        DayName::Short,
        Layout::Offset("%b %d %H:%M:%S %z %Y"),
    ),
    // Mon Jan _2 15:04:05 MST 2006
    (
        "UnixDate",
        DayName::Short,
        Layout::Named {
            format: "%b %d %H:%M:%S %Y",
            zone_at: 3,
        },
    ),
    // Mon Jan _2 15:04:05 2006
    ("ANSIC", DayName::Short, Layout::Naive("%b %d %H:%M:%S %Y")),
    // 01/02 03:04:05PM '06 -0700
    (
        "Layout",
        DayName::None,
        Layout::Offset("%m/%d %I:%M:%S%p '%y %z"),
    ),
];

/// Parse a feed publish date into a UTC instant.
///
/// Layouts are tried in order and the first successful parse wins. When
/// none matches, the error carries the failure of the last attempt.
pub fn parse_pub_date(input: &str) -> Result<DateTime<Utc>> {
    let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut last_error = String::from("empty date string");

    for (name, day_name, layout) in LAYOUTS {
        let attempt = strip_day_name(&normalized, *day_name)
            .and_then(|rest| try_layout(rest, *layout));
        match attempt {
            Ok(dt) => return Ok(dt),
            Err(e) => last_error = format!("{name}: {e}"),
        }
    }

    Err(GatorError::Parse(format!(
        "unrecognized date {input:?} ({last_error})"
    )))
}

/// Remove the day-name token `expected` calls for, returning the rest.
fn strip_day_name(input: &str, expected: DayName) -> std::result::Result<&str, String> {
    let (long, comma) = match expected {
        DayName::None => return Ok(input),
        DayName::Short => (false, false),
        DayName::ShortComma => (false, true),
        DayName::LongComma => (true, true),
    };
    let (token, rest) = input
        .split_once(' ')
        .ok_or_else(|| "missing day name".to_string())?;

    let day = if comma {
        token.strip_suffix(',')
    } else {
        Some(token)
    };
    match day {
        Some(day) if (day.len() > 3) == long && day.parse::<Weekday>().is_ok() => Ok(rest),
        _ => Err(format!("bad day name {token:?}")),
    }
}

fn try_layout(input: &str, layout: Layout) -> std::result::Result<DateTime<Utc>, String> {
    match layout {
        Layout::Rfc3339 => DateTime::parse_from_rfc3339(input)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| e.to_string()),
        Layout::Offset(format) => DateTime::parse_from_str(input, format)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| e.to_string()),
        Layout::Named { format, zone_at } => {
            let mut tokens: Vec<&str> = input.split(' ').collect();
            if zone_at >= tokens.len() {
                return Err("missing zone".to_string());
            }
            let zone = tokens.remove(zone_at);
            let offset = zone_offset(zone).ok_or_else(|| format!("unknown zone {zone:?}"))?;
            let naive = NaiveDateTime::parse_from_str(&tokens.join(" "), format)
                .map_err(|e| e.to_string())?;
            offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| "ambiguous local time".to_string())
        }
        Layout::Naive(format) => NaiveDateTime::parse_from_str(input, format)
            .map(|naive| naive.and_utc())
            .map_err(|e| e.to_string()),
    }
}

/// Resolve a zone abbreviation to a fixed offset.
///
/// The RFC 822 North American zones are honoured; any other purely
/// alphabetic abbreviation is read as UTC.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    let hours = match zone.to_ascii_uppercase().as_str() {
        "UT" | "UTC" | "GMT" | "Z" => 0,
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        other if (2..=5).contains(&other.len()) && other.chars().all(|c| c.is_ascii_alphabetic()) => 0,
        _ => return None,
    };
    FixedOffset::east_opt(hours * 3600)
}

/// Parse an interval such as `"1m"`, `"30s"`, `"1h30m"` or `"1.5h"`.
///
/// Accepted units: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. The interval
/// must be positive.
pub fn parse_interval(input: &str) -> Result<Duration> {
    let invalid = || GatorError::Config(format!("invalid duration {input:?}"));
    let s = input.trim();
    if s.is_empty() || s.starts_with('-') {
        return Err(invalid());
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let mut total_nanos: f64 = 0.0;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        total_nanos += value * scale;
    }

    if !total_nanos.is_finite() || total_nanos < 1.0 || total_nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Format a timestamp for storage.
///
/// Fixed microsecond precision in UTC keeps lexical order equal to
/// chronological order.
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn from_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Format a DateTime<Utc> to the specified timezone.
///
/// Falls back to UTC when the timezone name is unknown.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}

/// Format an interval the way [`parse_interval`] reads it back, e.g.
/// `"1m0s"`, `"1h30m0s"`, `"1.5s"` or `"300ms"`.
pub fn format_interval(d: Duration) -> String {
    let nanos = d.subsec_nanos();
    let secs = d.as_secs();

    if secs == 0 {
        return match nanos {
            0 => "0s".to_string(),
            n if n < 1_000 => format!("{n}ns"),
            n if n < 1_000_000 => format!("{}µs", with_fraction(n / 1_000, n % 1_000, 3)),
            n => format!("{}ms", with_fraction(n / 1_000_000, n % 1_000_000, 6)),
        };
    }

    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = with_fraction(u32::try_from(secs % 60).unwrap_or(0), nanos, 9);

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn with_fraction(whole: u32, frac: u32, digits: usize) -> String {
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0digits$}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
