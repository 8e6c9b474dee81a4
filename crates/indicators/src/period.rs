//! Periods and seasons: the reference tables indicators are binned by.

use crate::error::IndicatorError;

/// Reserved season identifier covering all twelve months.
pub const ALL_SEASON: &str = "all";

/// A named, closed range of calendar years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    id: String,
    name: String,
    start: i32,
    end: i32,
}

impl Period {
    /// Creates a period covering `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError::InvalidPeriod`] if `start > end`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start: i32,
        end: i32,
    ) -> Result<Self, IndicatorError> {
        let id = id.into();
        if start > end {
            return Err(IndicatorError::InvalidPeriod { id, start, end });
        }
        Ok(Self {
            id,
            name: name.into(),
            start,
            end,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Whether `year` lies in the period.
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

/// A named set of calendar months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    id: String,
    months: Vec<u8>,
}

impl Season {
    /// Creates a season. An empty month list means all twelve months.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError::InvalidSeason`] if more than 12 months are
    /// given, a month lies outside `1..=12` or a month is repeated.
    pub fn new(id: impl Into<String>, months: Vec<u8>) -> Result<Self, IndicatorError> {
        let id = id.into();
        if months.is_empty() {
            return Ok(Self::all_months(id));
        }
        if months.len() > 12 {
            return Err(IndicatorError::InvalidSeason {
                id,
                reason: format!("{} months given, at most 12 allowed", months.len()),
            });
        }
        if let Some(&m) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(IndicatorError::InvalidSeason {
                id,
                reason: format!("month {m} outside 1..=12"),
            });
        }
        let mut sorted = months.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != months.len() {
            return Err(IndicatorError::InvalidSeason {
                id,
                reason: "repeated month".to_string(),
            });
        }
        Ok(Self { id, months })
    }

    /// The reserved all-year season.
    pub fn all() -> Self {
        Self::all_months(ALL_SEASON.to_string())
    }

    fn all_months(id: String) -> Self {
        Self {
            id,
            months: (1..=12).collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Months of the season in configured order.
    pub fn months(&self) -> &[u8] {
        &self.months
    }

    /// Whether `month` belongs to the season.
    pub fn contains(&self, month: u8) -> bool {
        self.months.contains(&month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_bounds_inclusive() {
        let p = Period::new("ref", "Reference", 1981, 2010).unwrap();
        assert!(p.contains(1981));
        assert!(p.contains(2010));
        assert!(!p.contains(2011));
    }

    #[test]
    fn inverted_period_rejected() {
        assert!(matches!(
            Period::new("p", "P", 2050, 2020),
            Err(IndicatorError::InvalidPeriod { start: 2050, end: 2020, .. })
        ));
    }

    #[test]
    fn empty_months_mean_all() {
        let s = Season::new("year", vec![]).unwrap();
        assert_eq!(s.months(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert_eq!(Season::all().id(), "all");
    }

    #[test]
    fn season_month_checks() {
        assert!(Season::new("djf", vec![12, 1, 2]).unwrap().contains(12));
        assert!(Season::new("bad", vec![0, 1]).is_err());
        assert!(Season::new("bad", vec![13]).is_err());
        assert!(Season::new("dup", vec![1, 1]).is_err());
        assert!(Season::new("long", (1..=13).map(|m| (m % 12) + 1).collect()).is_err());
    }
}
