//! Calendar-tagged time axis.

use kapy_calendar::{AlignOn, Calendar, CfDate, convert_dates, date_sequence, month_starts};

use crate::error::SeriesError;

/// An ordered sequence of dates together with the calendar they live in.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    calendar: Calendar,
    dates: Vec<CfDate>,
}

impl TimeAxis {
    /// Creates a time axis.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::Calendar`] if a date does not exist in
    /// `calendar`, or [`SeriesError::TimeNotIncreasing`] if the dates are not
    /// strictly increasing.
    pub fn new(calendar: Calendar, dates: Vec<CfDate>) -> Result<Self, SeriesError> {
        for d in &dates {
            calendar.validate(d.year(), d.month(), d.day())?;
        }
        if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SeriesError::TimeNotIncreasing { index: i + 1 });
        }
        Ok(Self { calendar, dates })
    }

    /// `n_days` consecutive days starting at `start`.
    pub fn daily(calendar: Calendar, start: CfDate, n_days: usize) -> Self {
        Self {
            calendar,
            dates: date_sequence(calendar, start, n_days),
        }
    }

    /// `n_months` consecutive first-of-month stamps starting at `start`'s month.
    pub fn monthly(calendar: Calendar, start: CfDate, n_months: usize) -> Self {
        Self {
            calendar,
            dates: month_starts(start, n_months),
        }
    }

    /// Builds an axis from dates already known to be valid and increasing.
    pub(crate) fn from_parts(calendar: Calendar, dates: Vec<CfDate>) -> Self {
        Self { calendar, dates }
    }

    /// The calendar of this axis.
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// The dates of this axis.
    pub fn dates(&self) -> &[CfDate] {
        &self.dates
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns `true` if the axis has no time steps.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Returns `true` for a non-empty axis with at most one step per
    /// calendar month.
    pub fn is_monthly(&self) -> bool {
        !self.dates.is_empty()
            && self
                .dates
                .windows(2)
                .all(|w| (w[0].year(), w[0].month()) != (w[1].year(), w[1].month()))
    }

    /// Calendar year of each time step.
    pub fn years(&self) -> Vec<i32> {
        self.dates.iter().map(|d| d.year()).collect()
    }

    /// Calendar month (1..=12) of each time step.
    pub fn months(&self) -> Vec<u8> {
        self.dates.iter().map(|d| d.month()).collect()
    }

    /// Fractional year of each time step in this axis' calendar.
    pub fn decimal_years(&self) -> Vec<f64> {
        self.dates
            .iter()
            .map(|&d| self.calendar.decimal_year(d))
            .collect()
    }

    /// First and last year covered, or `None` for an empty axis.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        Some((self.dates.first()?.year(), self.dates.last()?.year()))
    }

    /// Positions whose year lies in `start..=end`.
    pub fn indices_in_years(&self, start: i32, end: i32) -> Vec<usize> {
        self.dates
            .iter()
            .enumerate()
            .filter(|(_, d)| (start..=end).contains(&d.year()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Positions whose month is in `months`.
    pub fn indices_in_months(&self, months: &[u8]) -> Vec<usize> {
        self.dates
            .iter()
            .enumerate()
            .filter(|(_, d)| months.contains(&d.month()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Sub-axis at `indices` (which must be increasing).
    pub fn select(&self, indices: &[usize]) -> Self {
        Self::from_parts(
            self.calendar,
            indices.iter().map(|&i| self.dates[i]).collect(),
        )
    }

    /// Converts this axis to `target`, returning the new axis and the
    /// source positions that survived.
    pub fn convert(&self, target: Calendar) -> (Self, Vec<usize>) {
        if self.is_monthly() {
            // First-of-month stamps exist in every calendar.
            let dates = self.dates.iter().map(|d| d.first_of_month()).collect();
            return (Self::from_parts(target, dates), (0..self.len()).collect());
        }
        let align = AlignOn::for_calendars(self.calendar, target);
        let conv = convert_dates(&self.dates, self.calendar, target, align);
        (
            Self::from_parts(target, conv.dates().to_vec()),
            conv.kept().to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u8, d: u8) -> CfDate {
        CfDate::new(Calendar::NoLeap, y, m, d).unwrap()
    }

    #[test]
    fn rejects_unordered() {
        let err = TimeAxis::new(Calendar::NoLeap, vec![date(2000, 1, 2), date(2000, 1, 1)])
            .unwrap_err();
        assert_eq!(err, SeriesError::TimeNotIncreasing { index: 1 });
    }

    #[test]
    fn rejects_invalid_date_for_calendar() {
        let feb30 = CfDate::new(Calendar::Day360, 2000, 2, 30).unwrap();
        assert!(matches!(
            TimeAxis::new(Calendar::NoLeap, vec![feb30]),
            Err(SeriesError::Calendar(_))
        ));
    }

    #[test]
    fn year_and_month_indices() {
        let axis = TimeAxis::monthly(Calendar::NoLeap, date(2000, 1, 1), 36);
        assert_eq!(axis.year_range(), Some((2000, 2002)));
        assert_eq!(axis.indices_in_years(2001, 2001), (12..24).collect::<Vec<_>>());
        assert_eq!(axis.indices_in_months(&[12]), vec![11, 23, 35]);
    }

    #[test]
    fn monthly_resolution() {
        let start = date(2000, 1, 1);
        assert!(TimeAxis::monthly(Calendar::NoLeap, start, 24).is_monthly());
        assert!(!TimeAxis::daily(Calendar::NoLeap, start, 40).is_monthly());
        assert!(!TimeAxis::daily(Calendar::NoLeap, start, 0).is_monthly());
    }

    #[test]
    fn monthly_axis_keeps_every_month() {
        let start = CfDate::new(Calendar::Day360, 2001, 1, 1).unwrap();
        let axis = TimeAxis::monthly(Calendar::Day360, start, 12);
        let (converted, kept) = axis.convert(Calendar::Standard);
        assert_eq!(kept, (0..12).collect::<Vec<_>>());
        assert_eq!(converted.calendar(), Calendar::Standard);
        assert_eq!(converted.months(), (1..=12).collect::<Vec<u8>>());
        assert!(converted.dates().iter().all(|d| d.day() == 1));
    }

    #[test]
    fn convert_to_360_day() {
        let axis = TimeAxis::daily(Calendar::NoLeap, date(2000, 1, 1), 365);
        let (converted, kept) = axis.convert(Calendar::Day360);
        assert_eq!(converted.calendar(), Calendar::Day360);
        assert_eq!(converted.len(), 360);
        assert_eq!(kept.len(), 360);
    }
}
