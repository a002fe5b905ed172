//! Opening-hours text → [`OpeningHours`].
//!
//! Input is one line per day, `"Monday: 09:00 to 18:00"`, with a lunch
//! closure written as two ranges: `"Monday: 09:00 to 13:00, 14:00 to 18:00"`.
//! A day whose ranges cannot be read is recorded as closed rather than
//! failing the whole week.

use chrono::{NaiveTime, Timelike};
use psireg_core::{DayHours, OpeningHours};

use crate::error::ParseError;
use crate::parse_helpers::clean_up_string;

const RANGE_SEPARATOR: &str = " to ";
const LUNCH_SEPARATOR: &str = ", ";

/// Parses every day line, skipping lines with no day label.
#[must_use]
pub fn parse_opening_hours(lines: &[String]) -> OpeningHours {
    let days = lines
        .iter()
        .filter_map(|line| match parse_day_line(line) {
            Ok(day) => Some(day),
            Err(err) => {
                tracing::debug!(error = %err, "skipping opening hours line");
                None
            }
        })
        .collect();
    OpeningHours::from_days(days)
}

/// Splits `"Day: ranges"` on the first colon and parses the ranges.
///
/// # Errors
///
/// Returns [`ParseError::MalformedDay`] when the line has no `Day:` prefix.
pub fn parse_day_line(line: &str) -> Result<(String, DayHours), ParseError> {
    let malformed = || ParseError::MalformedDay {
        line: line.to_owned(),
    };
    let (day, ranges) = line.split_once(':').ok_or_else(malformed)?;
    let day = clean_up_string(day).ok_or_else(malformed)?;
    Ok((day, parse_day_hours(ranges)))
}

/// Parses the time ranges for one day.
#[must_use]
pub fn parse_day_hours(ranges: &str) -> DayHours {
    let ranges = ranges.trim();
    let parts: Vec<&str> = ranges.split(LUNCH_SEPARATOR).collect();
    match parts.as_slice() {
        [single] => match parse_range(single) {
            Some((open, closed)) => DayHours {
                open: Some(open),
                closed: Some(closed),
                lunch_closure: None,
                lunch_reopen: None,
                hours_open: span_hours(open, closed),
            },
            None => DayHours::closed_all_day(),
        },
        [morning, afternoon] => match (parse_range(morning), parse_range(afternoon)) {
            (Some((open, lunch_closure)), Some((lunch_reopen, closed))) => {
                let lunch = clock_hours(lunch_reopen) - clock_hours(lunch_closure);
                let mut hours_open = span_hours(open, closed);
                if lunch > 0.0 {
                    hours_open -= lunch;
                }
                DayHours {
                    open: Some(open),
                    closed: Some(closed),
                    lunch_closure: Some(lunch_closure),
                    lunch_reopen: Some(lunch_reopen),
                    hours_open,
                }
            }
            _ => DayHours::closed_all_day(),
        },
        _ => DayHours::closed_all_day(),
    }
}

/// Parses `"HH:MM to HH:MM"`.
fn parse_range(text: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (open, closed) = text.trim().split_once(RANGE_SEPARATOR)?;
    Some((parse_clock(open)?, parse_clock(closed)?))
}

/// Parses `HH:MM`; `24:00` is read as midnight.
fn parse_clock(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if text == "24:00" {
        return Some(NaiveTime::MIN);
    }
    NaiveTime::parse_from_str(text, "%H:%M").ok()
}

fn clock_hours(time: NaiveTime) -> f64 {
    f64::from(time.num_seconds_from_midnight()) / 3600.0
}

/// Hours between `open` and `closed`, modulo 24.
///
/// The register carries closing times keyed in as 12-hour values. When the
/// closing time sorts before the opening time (and is not midnight), or is
/// exactly 10:00, 12 hours are added to the closing time before taking the
/// difference. Opening times are never adjusted.
#[must_use]
pub fn span_hours(open: NaiveTime, closed: NaiveTime) -> f64 {
    let ten_am = NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut closed_hours = clock_hours(closed);
    if (open > closed && closed != NaiveTime::MIN) || closed == ten_am {
        closed_hours += 12.0;
    }
    (closed_hours - clock_hours(open)).rem_euclid(24.0)
}
