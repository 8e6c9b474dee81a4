//! Conversion of a date axis from one calendar to another.

use std::collections::BTreeSet;

use crate::date::CfDate;
use crate::kind::Calendar;

/// How dates are carried across a calendar change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOn {
    /// Keep month and day; drop dates that do not exist in the target.
    Date,
    /// Rescale the day of year to the target year length.
    Year,
}

impl AlignOn {
    /// Alignment rule for a conversion between `source` and `target`.
    ///
    /// Aligning on date would manufacture or lose whole month-ends when a
    /// 360-day calendar is involved, so those conversions align on year.
    pub fn for_calendars(source: Calendar, target: Calendar) -> Self {
        if source == Calendar::Day360 || target == Calendar::Day360 {
            AlignOn::Year
        } else {
            AlignOn::Date
        }
    }
}

/// Result of [`convert_dates`]: the surviving source positions and their
/// dates in the target calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarConversion {
    kept: Vec<usize>,
    dates: Vec<CfDate>,
}

impl CalendarConversion {
    /// Indices into the source axis of the dates that survived conversion,
    /// in source order.
    pub fn kept(&self) -> &[usize] {
        &self.kept
    }

    /// Converted dates, one per entry of [`CalendarConversion::kept`].
    pub fn dates(&self) -> &[CfDate] {
        &self.dates
    }

    /// Number of source dates dropped by the conversion.
    pub fn n_dropped(&self, n_source: usize) -> usize {
        n_source.saturating_sub(self.kept.len())
    }
}

/// Converts `dates` (valid in `source`) into `target`.
///
/// With [`AlignOn::Date`], month and day are kept and dates that do not
/// exist in `target` are dropped. With [`AlignOn::Year`], day of year `d` in
/// a source year of `S` days becomes `round(T * d / S)` in a target year of
/// `T` days (ties to even), and a target date already produced by an earlier
/// source date is dropped. A same-calendar conversion is the identity.
pub fn convert_dates(
    dates: &[CfDate],
    source: Calendar,
    target: Calendar,
    align: AlignOn,
) -> CalendarConversion {
    if source == target {
        return CalendarConversion {
            kept: (0..dates.len()).collect(),
            dates: dates.to_vec(),
        };
    }

    let mut kept = Vec::with_capacity(dates.len());
    let mut out = Vec::with_capacity(dates.len());
    let mut seen = BTreeSet::new();

    for (i, &date) in dates.iter().enumerate() {
        let converted = match align {
            AlignOn::Date => target
                .validate(date.year(), date.month(), date.day())
                .ok()
                .map(|()| date),
            AlignOn::Year => year_aligned(date, source, target),
        };
        let Some(new_date) = converted else {
            continue;
        };
        if seen.insert(new_date) {
            kept.push(i);
            out.push(new_date);
        }
    }

    CalendarConversion { kept, dates: out }
}

fn year_aligned(date: CfDate, source: Calendar, target: Calendar) -> Option<CfDate> {
    let year = date.year();
    let source_len = source.days_in_year(year) as f64;
    let target_len = target.days_in_year(year);
    let doy = source.day_of_year(date) as f64;
    let scaled = (target_len as f64 * doy / source_len).round_ties_even();
    let new_doy = (scaled as u16).clamp(1, target_len);
    target.from_day_of_year(year, new_doy).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::date_sequence;

    fn year_of(calendar: Calendar, year: i32) -> Vec<CfDate> {
        let start = CfDate::new(calendar, year, 1, 1).unwrap();
        date_sequence(calendar, start, calendar.days_in_year(year) as usize)
    }

    #[test]
    fn align_rule() {
        assert_eq!(
            AlignOn::for_calendars(Calendar::Day360, Calendar::NoLeap),
            AlignOn::Year
        );
        assert_eq!(
            AlignOn::for_calendars(Calendar::Standard, Calendar::Day360),
            AlignOn::Year
        );
        assert_eq!(
            AlignOn::for_calendars(Calendar::NoLeap, Calendar::ProlepticGregorian),
            AlignOn::Date
        );
    }

    #[test]
    fn identity_for_same_calendar() {
        let dates = year_of(Calendar::NoLeap, 2001);
        let conv = convert_dates(&dates, Calendar::NoLeap, Calendar::NoLeap, AlignOn::Date);
        assert_eq!(conv.kept().len(), 365);
        assert_eq!(conv.dates(), dates.as_slice());
    }

    #[test]
    fn date_align_drops_feb_29() {
        let dates = year_of(Calendar::ProlepticGregorian, 2004);
        let conv = convert_dates(
            &dates,
            Calendar::ProlepticGregorian,
            Calendar::NoLeap,
            AlignOn::Date,
        );
        assert_eq!(conv.dates().len(), 365);
        assert_eq!(conv.n_dropped(dates.len()), 1);
        // Feb 29 is source index 59.
        assert!(!conv.kept().contains(&59));
    }

    #[test]
    fn year_align_365_to_360_drops_five() {
        let dates = year_of(Calendar::NoLeap, 2001);
        let conv = convert_dates(&dates, Calendar::NoLeap, Calendar::Day360, AlignOn::Year);
        assert_eq!(conv.dates().len(), 360);
        assert_eq!(conv.dates()[0], CfDate::new(Calendar::Day360, 2001, 1, 1).unwrap());
        assert_eq!(
            *conv.dates().last().unwrap(),
            CfDate::new(Calendar::Day360, 2001, 12, 30).unwrap()
        );
        // Output stays strictly increasing.
        assert!(conv.dates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn year_align_360_to_365_keeps_all() {
        let dates = year_of(Calendar::Day360, 2001);
        let conv = convert_dates(&dates, Calendar::Day360, Calendar::NoLeap, AlignOn::Year);
        assert_eq!(conv.dates().len(), 360);
        assert_eq!(
            *conv.dates().last().unwrap(),
            CfDate::new(Calendar::NoLeap, 2001, 12, 31).unwrap()
        );
    }

    #[test]
    fn kept_indices_follow_source_order() {
        let dates = year_of(Calendar::AllLeap, 2001);
        let conv = convert_dates(&dates, Calendar::AllLeap, Calendar::Day360, AlignOn::Year);
        assert!(conv.kept().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(conv.kept().len(), conv.dates().len());
    }
}
