//! Error types for the kapy-calendar crate.

/// Error type for all fallible operations in the kapy-calendar crate.
///
/// Covers validation of dates against a specific calendar system, parsing of
/// calendar names and ISO-like date strings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    /// Returned when a month number is outside the valid range 1..=12.
    #[error("invalid month: {month} (must be 1..=12)")]
    InvalidMonth {
        /// The invalid month number that was provided.
        month: u8,
    },

    /// Returned when a day does not exist in the given month of a calendar.
    #[error("invalid date {year:04}-{month:02}-{day:02} in the {calendar} calendar")]
    InvalidDate {
        /// Year of the rejected date.
        year: i32,
        /// Month of the rejected date.
        month: u8,
        /// Day of the rejected date.
        day: u8,
        /// CF name of the calendar the date was checked against.
        calendar: &'static str,
    },

    /// Returned when a day-of-year exceeds the length of the year.
    #[error("invalid day of year {doy} for year {year} (max {max})")]
    InvalidDayOfYear {
        /// Year for which the day-of-year was requested.
        year: i32,
        /// The invalid day-of-year value.
        doy: u16,
        /// Number of days in that year.
        max: u16,
    },

    /// Returned when a calendar name is not one of the CF calendar names.
    #[error("unknown calendar: '{name}'")]
    UnknownCalendar {
        /// The unrecognised calendar name.
        name: String,
    },

    /// Returned when a date string is not of the form `YYYY-MM-DD`.
    #[error("malformed date string: '{text}' (expected YYYY-MM-DD)")]
    MalformedDate {
        /// The text that could not be parsed.
        text: String,
    },
}
