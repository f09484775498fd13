//! Time-of-day handling for connection records.
//!
//! The transit service labels departures with "HH:MM" strings and no date.
//! This module parses those labels and computes waiting times against a
//! reference clock, correcting for differences measured across midnight.

use chrono::{NaiveTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A naive difference at or above this many minutes is taken to have been
/// measured on the wrong side of midnight.
const MIDNIGHT_CORRECTION_THRESHOLD: u32 = 1000;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day with minute precision, as printed on departure boards.
///
/// # Examples
///
/// ```
/// use departure_board::domain::ClockTime;
///
/// let t = ClockTime::parse_hhmm("07:05").unwrap();
/// assert_eq!(t.hour(), 7);
/// assert_eq!(t.minute(), 5);
/// assert_eq!(t.to_string(), "07:05");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Create a time from hour and minute, if both are in range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Parse a time from "HH:MM" format.
    ///
    /// # Examples
    ///
    /// ```
    /// use departure_board::domain::ClockTime;
    ///
    /// assert!(ClockTime::parse_hhmm("00:00").is_ok());
    /// assert!(ClockTime::parse_hhmm("23:59").is_ok());
    ///
    /// assert!(ClockTime::parse_hhmm("2359").is_err());
    /// assert!(ClockTime::parse_hhmm("7:05").is_err());
    /// assert!(ClockTime::parse_hhmm("24:00").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        self.hour as u32
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        self.minute as u32
    }

    /// Minutes elapsed since midnight (0-1439).
    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour() * 60 + self.minute()
    }

    /// Minutes to wait from `reference` until this time.
    ///
    /// The naive absolute difference is used unless it is at least 1000
    /// minutes, in which case it was measured across midnight the wrong way
    /// round and `1440 - raw` is returned instead. The result is always in
    /// `0..1440`.
    ///
    /// # Examples
    ///
    /// ```
    /// use departure_board::domain::ClockTime;
    ///
    /// let now = ClockTime::parse_hhmm("23:55").unwrap();
    /// let dep = ClockTime::parse_hhmm("00:05").unwrap();
    /// assert_eq!(dep.wait_minutes_from(now), 10);
    /// ```
    pub fn wait_minutes_from(&self, reference: ClockTime) -> u32 {
        let raw = self
            .minutes_since_midnight()
            .abs_diff(reference.minutes_since_midnight());
        if raw < MIDNIGHT_CORRECTION_THRESHOLD {
            raw
        } else {
            MINUTES_PER_DAY - raw
        }
    }
}

/// Truncates to the minute.
impl From<NaiveTime> for ClockTime {
    fn from(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({:02}:{:02})", self.hour, self.minute)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
