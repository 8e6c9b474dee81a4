//! Date sequence generation for any calendar.

use crate::date::CfDate;
use crate::kind::Calendar;

/// Generates a contiguous daily sequence in `calendar`.
///
/// Starting from `start`, produces exactly `n_days` consecutive dates by
/// repeatedly advancing to the next day. Month and year boundaries follow
/// the calendar's rules (February 30th exists in `360_day`, October 5..=14
/// 1582 are skipped in `standard`).
///
/// # Example
///
/// ```ignore
/// let start = CfDate::new(Calendar::Day360, 2000, 2, 29).unwrap();
/// let dates = date_sequence(Calendar::Day360, start, 3);
/// // Feb 29, Feb 30, Mar 1
/// ```
pub fn date_sequence(calendar: Calendar, start: CfDate, n_days: usize) -> Vec<CfDate> {
    let mut dates = Vec::with_capacity(n_days);
    if n_days == 0 {
        return dates;
    }
    dates.push(start);
    let mut current = start;
    for _ in 1..n_days {
        current = calendar.next_day(current);
        dates.push(current);
    }
    dates
}

/// Generates `n_months` consecutive first-of-month dates starting at the
/// month containing `start`.
///
/// The first of a month exists in every calendar, so the result is valid
/// regardless of which calendar the owning axis uses.
pub fn month_starts(start: CfDate, n_months: usize) -> Vec<CfDate> {
    let mut dates = Vec::with_capacity(n_months);
    let mut current = start.first_of_month();
    for _ in 0..n_months {
        dates.push(current);
        current = current.next_month_start();
    }
    dates
}
