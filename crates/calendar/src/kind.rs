//! CF calendar systems and their month/year lengths.

use std::fmt;
use std::str::FromStr;

use crate::date::CfDate;
use crate::error::CalendarError;

/// Month lengths for a non-leap year (index 0 unused).
const DAYS_PER_MONTH: [u8; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Year of the Julian-to-Gregorian switch in the `standard` calendar.
const REFORM_YEAR: i32 = 1582;
/// October 5..=14 1582 do not exist in the `standard` calendar.
const REFORM_MONTH: u8 = 10;
const REFORM_GAP_FIRST: u8 = 5;
const REFORM_GAP_LAST: u8 = 14;
const REFORM_GAP_LEN: u8 = REFORM_GAP_LAST - REFORM_GAP_FIRST + 1;

/// A CF-conventions calendar system.
///
/// Climate-model output is routinely stored on idealised calendars, so every
/// date computation in the pipeline goes through one of these variants rather
/// than through an epoch-based timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Calendar {
    /// Mixed Julian/Gregorian calendar (`standard`, `gregorian`).
    Standard,
    /// Gregorian rules extended backwards in time.
    ProlepticGregorian,
    /// Julian leap-year rule throughout.
    Julian,
    /// 365-day years (`noleap`, `365_day`).
    NoLeap,
    /// 366-day years (`all_leap`, `366_day`).
    AllLeap,
    /// Twelve 30-day months (`360_day`).
    Day360,
}

impl Calendar {
    /// Returns the canonical CF name of the calendar.
    pub fn name(self) -> &'static str {
        match self {
            Calendar::Standard => "standard",
            Calendar::ProlepticGregorian => "proleptic_gregorian",
            Calendar::Julian => "julian",
            Calendar::NoLeap => "noleap",
            Calendar::AllLeap => "all_leap",
            Calendar::Day360 => "360_day",
        }
    }

    /// Returns `true` if `year` contains a February 29th (or, for the
    /// 360-day calendar, never).
    pub fn is_leap_year(self, year: i32) -> bool {
        match self {
            Calendar::NoLeap | Calendar::Day360 => false,
            Calendar::AllLeap => true,
            Calendar::Julian => year.rem_euclid(4) == 0,
            Calendar::ProlepticGregorian => gregorian_leap(year),
            Calendar::Standard => {
                if year < REFORM_YEAR {
                    year.rem_euclid(4) == 0
                } else {
                    gregorian_leap(year)
                }
            }
        }
    }

    /// Returns the highest day number of `month` in `year`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidMonth`] if `month` is outside 1..=12.
    pub fn days_in_month(self, year: i32, month: u8) -> Result<u8, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::InvalidMonth { month });
        }
        if self == Calendar::Day360 {
            return Ok(30);
        }
        if month == 2 && self.is_leap_year(year) {
            return Ok(29);
        }
        Ok(DAYS_PER_MONTH[month as usize])
    }

    /// Returns the number of days in `year`.
    pub fn days_in_year(self, year: i32) -> u16 {
        match self {
            Calendar::Day360 => 360,
            Calendar::Standard if year == REFORM_YEAR => 365 - REFORM_GAP_LEN as u16,
            _ if self.is_leap_year(year) => 366,
            _ => 365,
        }
    }

    /// Checks that `year-month-day` exists in this calendar.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidMonth`] or [`CalendarError::InvalidDate`].
    pub fn validate(self, year: i32, month: u8, day: u8) -> Result<(), CalendarError> {
        let max_day = self.days_in_month(year, month)?;
        let in_reform_gap = self == Calendar::Standard
            && year == REFORM_YEAR
            && month == REFORM_MONTH
            && (REFORM_GAP_FIRST..=REFORM_GAP_LAST).contains(&day);
        if day == 0 || day > max_day || in_reform_gap {
            return Err(CalendarError::InvalidDate {
                year,
                month,
                day,
                calendar: self.name(),
            });
        }
        Ok(())
    }

    /// Returns the 1-based day of year of `date`.
    ///
    /// The date is assumed to be valid in this calendar.
    pub fn day_of_year(self, date: CfDate) -> u16 {
        let mut doy = date.day() as u16;
        for m in 1..date.month() {
            doy += self.effective_month_len(date.year(), m) as u16;
        }
        if self.is_reform_month(date.year(), date.month()) && date.day() > REFORM_GAP_LAST {
            doy -= REFORM_GAP_LEN as u16;
        }
        doy
    }

    /// Builds the date with 1-based day of year `doy` in `year`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDayOfYear`] if `doy` is 0 or exceeds
    /// [`Calendar::days_in_year`].
    pub fn from_day_of_year(self, year: i32, doy: u16) -> Result<CfDate, CalendarError> {
        let max = self.days_in_year(year);
        if doy == 0 || doy > max {
            return Err(CalendarError::InvalidDayOfYear { year, doy, max });
        }
        let mut remaining = doy;
        for month in 1u8..=12 {
            let len = self.effective_month_len(year, month) as u16;
            if remaining <= len {
                let mut day = remaining as u8;
                if self.is_reform_month(year, month) && day >= REFORM_GAP_FIRST {
                    day += REFORM_GAP_LEN;
                }
                return Ok(CfDate::from_parts(year, month, day));
            }
            remaining -= len;
        }
        // Unreachable: doy <= days_in_year is the sum of effective month lengths.
        Err(CalendarError::InvalidDayOfYear { year, doy, max })
    }

    /// Returns the day after `date`.
    pub fn next_day(self, date: CfDate) -> CfDate {
        let (year, month, day) = (date.year(), date.month(), date.day());
        if self.is_reform_month(year, month) && day == REFORM_GAP_FIRST - 1 {
            return CfDate::from_parts(year, month, REFORM_GAP_LAST + 1);
        }
        let max_day = self.days_in_month(year, month).unwrap_or(31);
        if day < max_day {
            CfDate::from_parts(year, month, day + 1)
        } else if month < 12 {
            CfDate::from_parts(year, month + 1, 1)
        } else {
            CfDate::from_parts(year + 1, 1, 1)
        }
    }

    /// Returns `year + (doy - 1) / days_in_year`, the time coordinate used
    /// for trend fitting.
    pub fn decimal_year(self, date: CfDate) -> f64 {
        let doy = self.day_of_year(date) as f64;
        date.year() as f64 + (doy - 1.0) / self.days_in_year(date.year()) as f64
    }

    fn is_reform_month(self, year: i32, month: u8) -> bool {
        self == Calendar::Standard && year == REFORM_YEAR && month == REFORM_MONTH
    }

    /// Number of days that actually exist in the month.
    fn effective_month_len(self, year: i32, month: u8) -> u8 {
        let len = self.days_in_month(year, month).unwrap_or(0);
        if self.is_reform_month(year, month) {
            len - REFORM_GAP_LEN
        } else {
            len
        }
    }
}

fn gregorian_leap(year: i32) -> bool {
    (year.rem_euclid(4) == 0 && year.rem_euclid(100) != 0) || year.rem_euclid(400) == 0
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Calendar {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "gregorian" => Ok(Calendar::Standard),
            "proleptic_gregorian" => Ok(Calendar::ProlepticGregorian),
            "julian" => Ok(Calendar::Julian),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            other => Err(CalendarError::UnknownCalendar {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Calendar; 6] = [
        Calendar::Standard,
        Calendar::ProlepticGregorian,
        Calendar::Julian,
        Calendar::NoLeap,
        Calendar::AllLeap,
        Calendar::Day360,
    ];

    #[test]
    fn parse_aliases() {
        assert_eq!("gregorian".parse::<Calendar>().unwrap(), Calendar::Standard);
        assert_eq!("365_day".parse::<Calendar>().unwrap(), Calendar::NoLeap);
        assert_eq!("366_day".parse::<Calendar>().unwrap(), Calendar::AllLeap);
        assert_eq!("360_day".parse::<Calendar>().unwrap(), Calendar::Day360);
        assert_eq!(
            "Proleptic_Gregorian".parse::<Calendar>().unwrap(),
            Calendar::ProlepticGregorian
        );
    }

    #[test]
    fn parse_unknown() {
        assert!(matches!(
            "lunar".parse::<Calendar>(),
            Err(CalendarError::UnknownCalendar { .. })
        ));
    }

    #[test]
    fn name_round_trip() {
        for cal in ALL {
            assert_eq!(cal.name().parse::<Calendar>().unwrap(), cal);
        }
    }

    #[test]
    fn leap_rules() {
        assert!(Calendar::ProlepticGregorian.is_leap_year(2000));
        assert!(!Calendar::ProlepticGregorian.is_leap_year(1900));
        assert!(Calendar::Julian.is_leap_year(1900));
        assert!(Calendar::Standard.is_leap_year(1500));
        assert!(!Calendar::Standard.is_leap_year(1700));
        assert!(!Calendar::NoLeap.is_leap_year(2000));
        assert!(Calendar::AllLeap.is_leap_year(2001));
    }

    #[test]
    fn year_lengths() {
        assert_eq!(Calendar::Day360.days_in_year(2001), 360);
        assert_eq!(Calendar::NoLeap.days_in_year(2000), 365);
        assert_eq!(Calendar::AllLeap.days_in_year(2001), 366);
        assert_eq!(Calendar::Standard.days_in_year(1582), 355);
        assert_eq!(Calendar::ProlepticGregorian.days_in_year(1582), 365);
    }

    #[test]
    fn validate_feb_30_only_in_360_day() {
        assert!(Calendar::Day360.validate(2000, 2, 30).is_ok());
        for cal in [Calendar::Standard, Calendar::NoLeap, Calendar::AllLeap] {
            assert!(cal.validate(2000, 2, 30).is_err());
        }
    }

    #[test]
    fn validate_31st_rejected_in_360_day() {
        assert!(matches!(
            Calendar::Day360.validate(2000, 1, 31),
            Err(CalendarError::InvalidDate { calendar: "360_day", .. })
        ));
    }

    #[test]
    fn validate_reform_gap() {
        assert!(Calendar::Standard.validate(1582, 10, 10).is_err());
        assert!(Calendar::Standard.validate(1582, 10, 4).is_ok());
        assert!(Calendar::Standard.validate(1582, 10, 15).is_ok());
        assert!(Calendar::ProlepticGregorian.validate(1582, 10, 10).is_ok());
    }

    #[test]
    fn day_of_year_round_trip_every_calendar() {
        for cal in ALL {
            for year in [1582, 1900, 2000, 2001, 2400] {
                for doy in 1..=cal.days_in_year(year) {
                    let date = cal.from_day_of_year(year, doy).unwrap();
                    assert!(cal.validate(date.year(), date.month(), date.day()).is_ok());
                    assert_eq!(cal.day_of_year(date), doy, "{cal} {year} doy {doy}");
                }
            }
        }
    }

    #[test]
    fn from_day_of_year_out_of_range() {
        assert_eq!(
            Calendar::Day360.from_day_of_year(2000, 361).unwrap_err(),
            CalendarError::InvalidDayOfYear {
                year: 2000,
                doy: 361,
                max: 360,
            }
        );
    }

    #[test]
    fn next_day_crosses_reform_gap() {
        let d = CfDate::new(Calendar::Standard, 1582, 10, 4).unwrap();
        assert_eq!(
            Calendar::Standard.next_day(d),
            CfDate::new(Calendar::Standard, 1582, 10, 15).unwrap()
        );
    }

    #[test]
    fn next_day_360_month_end() {
        let d = CfDate::new(Calendar::Day360, 2000, 2, 30).unwrap();
        assert_eq!(
            Calendar::Day360.next_day(d),
            CfDate::new(Calendar::Day360, 2000, 3, 1).unwrap()
        );
    }

    #[test]
    fn decimal_year_start_of_year() {
        let d = CfDate::new(Calendar::NoLeap, 2050, 1, 1).unwrap();
        assert_eq!(Calendar::NoLeap.decimal_year(d), 2050.0);
    }

    #[test]
    fn decimal_year_mid_year_360() {
        let d = CfDate::new(Calendar::Day360, 2050, 7, 1).unwrap();
        approx::assert_relative_eq!(Calendar::Day360.decimal_year(d), 2050.5, epsilon = 1e-12);
    }
}
