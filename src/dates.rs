//! Conversions between calendar strings and millisecond timestamps, and the date
//! windows used to query around a fire event.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug, PartialEq)]
pub enum DateError {
    #[error("cannot parse `{input}` as {expected}")]
    Parse { input: String, expected: &'static str },

    #[error("timestamp {0} ms is out of range")]
    OutOfRange(i64),

    #[error("a window of {0} days either side is out of range")]
    SpanOutOfRange(i64),

    #[error("window start {start} is after end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Parses `YYYY-MM-DD` as midnight UTC and returns milliseconds since the epoch.
pub fn date_to_unix(date: &str) -> Result<i64, DateError> {
    let date = parse_date(date)?;
    Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

/// Parses `YYYY-MM-DD HH:MM:SS` as UTC and returns milliseconds since the epoch.
pub fn datetime_to_unix(datetime: &str) -> Result<i64, DateError> {
    Ok(parse_datetime(datetime)?.and_utc().timestamp_millis())
}

/// Formats a millisecond timestamp as `YYYY-MM-DD HH:MM:SS` in UTC. Sub-second
/// precision is dropped.
pub fn unix_to_date(ms: i64) -> Result<String, DateError> {
    let dt = DateTime::from_timestamp_millis(ms).ok_or(DateError::OutOfRange(ms))?;
    Ok(dt.format(DATETIME_FORMAT).to_string())
}

/// Calendar date (UTC) of a millisecond timestamp.
pub fn unix_to_naive_date(ms: i64) -> Result<NaiveDate, DateError> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.date_naive())
        .ok_or(DateError::OutOfRange(ms))
}

pub fn parse_date(date: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|_| DateError::Parse {
        input: date.to_string(),
        expected: "YYYY-MM-DD",
    })
}

pub fn parse_datetime(datetime: &str) -> Result<NaiveDateTime, DateError> {
    NaiveDateTime::parse_from_str(datetime.trim(), DATETIME_FORMAT).map_err(|_| {
        DateError::Parse {
            input: datetime.to_string(),
            expected: "YYYY-MM-DD HH:MM:SS",
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Closed range of calendar days. `start <= end` always holds.
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateError> {
        if start > end {
            return Err(DateError::Inverted { start, end });
        }
        Ok(DateWindow { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, DateError> {
        DateWindow::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn start_str(&self) -> String {
        self.start().format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end().format(DATE_FORMAT).to_string()
    }

    /// Millisecond bounds at midnight UTC of each end.
    pub fn millis(&self) -> (i64, i64) {
        let to_ms = |d: NaiveDate| d.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
        (to_ms(self.start), to_ms(self.end))
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_str(), self.end_str())
    }
}

/// Window of `days` either side of an event given as `YYYY-MM-DD HH:MM:SS`. The time
/// of day is dropped.
pub fn event_window(event_date: &str, days: i64) -> Result<DateWindow, DateError> {
    let event = parse_datetime(event_date)?;
    let span = days
        .checked_abs()
        .and_then(Duration::try_days)
        .ok_or(DateError::SpanOutOfRange(days))?;
    let start = event
        .checked_sub_signed(span)
        .ok_or(DateError::SpanOutOfRange(days))?;
    let end = event
        .checked_add_signed(span)
        .ok_or(DateError::SpanOutOfRange(days))?;
    DateWindow::new(start.date(), end.date())
}

/// First and last day of the month containing an event given as
/// `YYYY-MM-DD HH:MM:SS`.
pub fn month_window(event_date: &str) -> Result<DateWindow, DateError> {
    let event = parse_datetime(event_date)?.date();
    let (year, month) = (event.year(), event.month());
    let last = days_in_month(year, month);

    let start = event.with_day(1).ok_or_else(|| parse_error(event_date))?;
    let end = event.with_day(last).ok_or_else(|| parse_error(event_date))?;

    DateWindow::new(start, end)
}

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let index = (month.clamp(1, 12) - 1) as usize;
    if index == 1 && is_leap_year(year) {
        29
    } else {
        DAYS_IN_MONTH[index]
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn parse_error(input: &str) -> DateError {
    DateError::Parse {
        input: input.to_string(),
        expected: "YYYY-MM-DD HH:MM:SS",
    }
}

// -- Tests -------------------------------------------------------------------
