//! Date helper functions

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Abbreviated Portuguese month names, lowercase
pub const MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Placeholder rendered for dates that cannot be parsed
pub const INVALID_DATE: &str = "NaN NaN NaN";

/// Format a publication date in the local timezone
///
/// # Examples
/// ```ignore
/// format_date("2021-01-05T12:00:00+0000") // -> "5 jan 2021"
/// ```
pub fn format_date(input: &str) -> String {
    format_date_in(input, &Local)
}

/// Format a publication date, converting aware timestamps into `tz`
pub fn format_date_in<Tz: TimeZone>(input: &str, tz: &Tz) -> String {
    match parse_display_date(input, tz) {
        Some(date) => format!(
            "{} {} {}",
            date.day(),
            MONTHS[date.month0() as usize],
            date.year()
        ),
        None => {
            tracing::warn!("Unparseable date: {:?}", input);
            INVALID_DATE.to_string()
        }
    }
}

/// Format with an optional named zone, falling back to local time
pub fn format_date_with(input: &str, zone: Option<&chrono_tz::Tz>) -> String {
    match zone {
        Some(tz) => format_date_in(input, tz),
        None => format_date(input),
    }
}

/// Resolve the calendar date a string refers to, as seen from `tz`
fn parse_display_date<Tz: TimeZone>(input: &str, tz: &Tz) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(tz).date_naive());
    }

    // Prismic emits offsets without a colon: 2021-03-25T19:25:28+0000
    for format in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(dt.with_timezone(tz).date_naive());
        }
    }

    // Naive timestamps are already wall-clock time
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt.date());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }

    parse_formatted(input)
}

/// Parse our own output ("5 jan 2021") so formatting twice is stable
fn parse_formatted(input: &str) -> Option<NaiveDate> {
    let mut parts = input.split_whitespace();
    let day: u32 = parts.next()?.parse().ok()?;
    let month = parts.next()?.to_lowercase();
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let month = MONTHS.iter().position(|m| *m == month)? as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, day)
}
