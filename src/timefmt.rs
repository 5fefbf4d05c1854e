//! Time and number formatting helpers.
//!
//! Alarms carry their date and time as the text the browser submitted
//! (`YYYY-MM-DD` and `HH:MM`), so most conversions here start from strings.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

use crate::error::ClockError;

fn parse_int(what: &'static str, input: &str) -> Result<i64, ClockError> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| ClockError::format(what, input))
}

fn times_sixty(what: &'static str, input: &str) -> Result<i64, ClockError> {
    parse_int(what, input)?
        .checked_mul(60)
        .ok_or_else(|| ClockError::format(what, input))
}

/// Converts a minute count to seconds.
pub fn minutes_to_seconds(minutes: &str) -> Result<i64, ClockError> {
    times_sixty("minutes", minutes)
}

/// Converts an hour count to minutes.
pub fn hours_to_minutes(hours: &str) -> Result<i64, ClockError> {
    times_sixty("hours", hours)
}

/// Converts `HH:MM` into seconds since midnight. Hours must be 0-23 and
/// minutes 0-59.
pub fn hhmm_to_seconds(hhmm: &str) -> Result<i64, ClockError> {
    let malformed = || ClockError::format("time", hhmm);
    let (hours, minutes) = hhmm.split_once(':').ok_or_else(malformed)?;
    if minutes.contains(':') {
        return Err(malformed());
    }
    let hours = parse_int("time", hours).map_err(|_| malformed())?;
    let minutes = parse_int("time", minutes).map_err(|_| malformed())?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(malformed());
    }
    Ok((hours * 60 + minutes) * 60)
}

/// Rounds half-up: a fractional part of .5 or more goes towards +inf.
pub fn round_to_nearest_int(number: f64) -> i64 {
    (number + 0.5).floor() as i64
}

/// The local wall clock, which is what users type their alarms in.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Calendar date of `now` as `YYYY-MM-DD`.
pub fn today_string(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Wall-clock time of `now` as zero-padded `HH:MM`.
pub fn hhmm_string(now: NaiveDateTime) -> String {
    now.format("%H:%M").to_string()
}

pub fn seconds_of_day(now: NaiveDateTime) -> i64 {
    i64::from(now.num_seconds_from_midnight())
}

/// Splits the browser's `datetime-local` value (`2020-12-04T10:44`) into
/// a validated `(date, time)` pair.
pub fn split_datetime_input(input: &str) -> Result<(String, String), ClockError> {
    let mut parts = input.trim().split('T');
    let (Some(date), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ClockError::format("date-time", input));
    };
    validate_date(date)?;
    hhmm_to_seconds(time)?;
    Ok((date.to_string(), time.to_string()))
}

pub fn validate_date(date: &str) -> Result<(), ClockError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ClockError::format("date", date))
}
