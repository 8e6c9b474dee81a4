//! Calendar-aware date.

use std::fmt;

use crate::error::CalendarError;
use crate::kind::Calendar;

/// A day-resolution date in some [`Calendar`].
///
/// The year is a plain `i32`, so dates far beyond the range of ordinal or
/// epoch-based representations (year 2300 and later scenario runs) are
/// exact. Validity is checked against a calendar at construction; the date
/// itself does not carry the calendar, the owning time axis does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CfDate {
    year: i32,
    month: u8,
    day: u8,
}

impl CfDate {
    /// Creates a date, checking that it exists in `calendar`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError`] if the month or day is invalid for the
    /// calendar (e.g. February 30th outside the 360-day calendar).
    pub fn new(calendar: Calendar, year: i32, month: u8, day: u8) -> Result<Self, CalendarError> {
        calendar.validate(year, month, day)?;
        Ok(Self { year, month, day })
    }

    /// Builds a date without validation. Callers guarantee validity.
    pub(crate) fn from_parts(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Parses a `YYYY-MM-DD` string (an optional leading `-` is allowed for
    /// the year) and validates it against `calendar`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::MalformedDate`] for unparseable text, or a
    /// validation error if the date does not exist in `calendar`.
    pub fn parse(calendar: Calendar, text: &str) -> Result<Self, CalendarError> {
        let malformed = || CalendarError::MalformedDate {
            text: text.to_string(),
        };
        let trimmed = text.trim();
        let (sign, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, trimmed),
        };
        let mut parts = body.splitn(3, '-');
        let year: i32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(malformed)?;
        let month: u8 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(malformed)?;
        // Only the date portion of a "YYYY-MM-DD hh:mm:ss" stamp is used.
        let day: u8 = parts
            .next()
            .and_then(|p| p.split([' ', 'T']).next())
            .and_then(|p| p.parse().ok())
            .ok_or_else(malformed)?;
        Self::new(calendar, sign * year, month, day)
    }

    /// Returns the year.
    pub fn year(self) -> i32 {
        self.year
    }

    /// Returns the month (1..=12).
    pub fn month(self) -> u8 {
        self.month
    }

    /// Returns the day within the month.
    pub fn day(self) -> u8 {
        self.day
    }

    /// First day of this date's month. Valid in every calendar.
    pub fn first_of_month(self) -> Self {
        Self::from_parts(self.year, self.month, 1)
    }

    /// The 15th of this date's month. Valid in every calendar.
    pub fn mid_month(self) -> Self {
        Self::from_parts(self.year, self.month, 15)
    }

    /// January 1st of this date's year.
    pub fn first_of_year(self) -> Self {
        Self::from_parts(self.year, 1, 1)
    }

    /// January 1st of `year`.
    pub fn start_of_year(year: i32) -> Self {
        Self::from_parts(year, 1, 1)
    }

    /// First day of `month` in `year`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidMonth`] if `month` is outside 1..=12.
    pub fn start_of_month(year: i32, month: u8) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth { month });
        }
        Ok(Self::from_parts(year, month, 1))
    }

    /// The first day of the month following this date's month.
    pub fn next_month_start(self) -> Self {
        if self.month == 12 {
            Self::from_parts(self.year + 1, 1, 1)
        } else {
            Self::from_parts(self.year, self.month + 1, 1)
        }
    }
}

impl fmt::Display for CfDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.year < 0 {
            write!(f, "-{:04}-{:02}-{:02}", -self.year, self.month, self.day)
        } else {
            write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
        }
    }
}
