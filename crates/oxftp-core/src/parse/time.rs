//! Timestamp resolution for listing lines.
//!
//! Unix-style listings print either `Month Day HH:MM` (entries younger
//! than about six months) or `Month Day Year` (older entries); the year of
//! the `HH:MM` form is implicit and has to be reconstructed against the
//! server's clock. DOS-style listings print an explicit two-digit year and
//! a 12-hour clock. All calendar arithmetic goes through `chrono::Local`,
//! matching how the original timestamps were produced server-side.

use chrono::{Datelike, Local, TimeZone};

use super::ParseError;
use crate::stat::{PRECISION_DAY, PRECISION_MINUTE};

/// Slack allowed before a year-less timestamp counts as "in the future"
/// and is moved back one year. Tunable; not derived from any protocol
/// guarantee.
pub(crate) const FUTURE_TOLERANCE_SECS: f64 = 60.0;

/// Month number for an English three-letter abbreviation, case-insensitive.
pub(crate) fn month_number(token: &str) -> Option<u32> {
    let lower = token.to_ascii_lowercase();
    let number = match lower.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(number)
}

/// Epoch seconds for a local calendar time, if the combination exists.
fn local_epoch(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<f64> {
    Local
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .earliest()
        .map(|dt| dt.timestamp() as f64)
}

/// Resolve the `<month> <day> <year-or-HH:MM>` tokens of a Unix-style line.
///
/// Returns the modification time and its precision. A `HH:MM` token gets
/// the server's current year; if that would place the entry more than
/// [`FUTURE_TOLERANCE_SECS`] past the server's own clock
/// (`now + time_shift`), or the date does not exist in that year (Feb 29
/// seen across a year boundary), the previous year is used instead.
pub(crate) fn resolve_unix_mtime(
    month_token: &str,
    day_token: &str,
    year_or_time: &str,
    time_shift: f64,
    now: f64,
) -> Result<(f64, f64), ParseError> {
    let month = month_number(month_token).ok_or_else(|| ParseError::InvalidMonth {
        token: month_token.to_string(),
    })?;
    let day: u32 = day_token.parse().map_err(|_| ParseError::InvalidNumber {
        token: day_token.to_string(),
    })?;

    if let Some((hour_token, minute_token)) = year_or_time.split_once(':') {
        let hour: u32 = hour_token.parse().map_err(|_| ParseError::InvalidTime {
            token: year_or_time.to_string(),
        })?;
        let minute: u32 = minute_token.parse().map_err(|_| ParseError::InvalidTime {
            token: year_or_time.to_string(),
        })?;
        let server_now = now + time_shift;
        let reference_year = Local
            .timestamp_opt(server_now as i64, 0)
            .earliest()
            .map(|dt| dt.year())
            .ok_or_else(|| ParseError::InvalidDate {
                detail: "reference clock out of range".to_string(),
            })?;
        match local_epoch(reference_year, month, day, hour, minute) {
            Some(candidate) if candidate <= server_now + FUTURE_TOLERANCE_SECS => {
                Ok((candidate, PRECISION_MINUTE))
            }
            // In the future relative to the server, or nonexistent in the
            // reference year: the entry is from the previous year.
            _ => local_epoch(reference_year - 1, month, day, hour, minute)
                .map(|mtime| (mtime, PRECISION_MINUTE))
                .ok_or_else(|| ParseError::InvalidDate {
                    detail: format!("{month_token} {day_token} {year_or_time}"),
                }),
        }
    } else {
        let year: i32 = year_or_time.parse().map_err(|_| ParseError::InvalidNumber {
            token: year_or_time.to_string(),
        })?;
        local_epoch(year, month, day, 0, 0)
            .map(|mtime| (mtime, PRECISION_DAY))
            .ok_or_else(|| ParseError::InvalidDate {
                detail: format!("{month_token} {day_token} {year_or_time}"),
            })
    }
}

/// Resolve the `<MM-DD-YY> <HH:MM(AM|PM)>` tokens of a DOS-style line.
///
/// Two-digit years below 70 belong to the 2000s, the rest to the 1900s.
pub(crate) fn resolve_ms_mtime(date_token: &str, time_token: &str) -> Result<f64, ParseError> {
    let mut parts = date_token.split('-');
    let (Some(month_part), Some(day_part), Some(year_part), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::InvalidDate {
            detail: format!("expected MM-DD-YY, got {date_token:?}"),
        });
    };
    let month: u32 = month_part.parse().map_err(|_| ParseError::InvalidNumber {
        token: month_part.to_string(),
    })?;
    let day: u32 = day_part.parse().map_err(|_| ParseError::InvalidNumber {
        token: day_part.to_string(),
    })?;
    let two_digit: i32 = year_part.parse().map_err(|_| ParseError::InvalidNumber {
        token: year_part.to_string(),
    })?;
    let year = if two_digit < 70 {
        2000 + two_digit
    } else {
        1900 + two_digit
    };

    let (hour, minute) = parse_meridiem_time(time_token)?;
    local_epoch(year, month, day, hour, minute).ok_or_else(|| ParseError::InvalidDate {
        detail: format!("{date_token} {time_token}"),
    })
}

/// Decode a 12-hour `HH:MM(AM|PM)` token into 24-hour (hour, minute).
fn parse_meridiem_time(token: &str) -> Result<(u32, u32), ParseError> {
    let invalid = || ParseError::InvalidTime {
        token: token.to_string(),
    };
    let upper = token.to_ascii_uppercase();
    let (clock, is_pm) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest, false)
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest, true)
    } else {
        return Err(invalid());
    };
    let (hour_part, minute_part) = clock.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour_part.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_part.parse().map_err(|_| invalid())?;
    if hour == 0 || hour > 12 || minute > 59 {
        return Err(invalid());
    }
    Ok(((hour % 12) + if is_pm { 12 } else { 0 }, minute))
}
