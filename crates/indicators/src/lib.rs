//! Period and season binning of gridded climate series into indicators.
//!
//! An indicator reduces a series over `(bin × season)` slices, where bins
//! are configured periods, calendar years or calendar months, and pairs the
//! result with a delta against the first (reference) period.
//!
//! # Pipeline
//!
//! 1. **Check** the definition against the shared [`IndicatorContext`]:
//!    seasons exist, custom statistics are registered, periods are given
//! 2. **Assign** every time step to a bin and filter each bin by season
//! 3. **Reduce** each slice with the [`Statistic`]; empty slices give `NaN`
//! 4. **Delta** every cell against the reference period (subtract or divide)
//!
//! # Quick Start
//!
//! ```no_run
//! use kapy_indicators::{IndicatorContext, IndicatorDefinition, Period, Season, Statistic, build_indicator};
//! # fn series() -> kapy_series::GriddedSeries { unimplemented!() }
//!
//! let context = IndicatorContext::new(vec![
//!     Period::new("ref", "1981-2010", 1981, 2010).unwrap(),
//!     Period::new("far", "2071-2100", 2071, 2100).unwrap(),
//! ])
//! .with_season(Season::new("JJA", vec![6, 7, 8]).unwrap());
//!
//! let def = IndicatorDefinition::new("101", Statistic::Mean).with_seasons(["all", "JJA"]);
//! let result = build_indicator(&series(), &def, &context).unwrap();
//! println!("{:?}", result.delta(1, 1, 0));
//! ```

mod build;
mod definition;
mod error;
mod period;
mod result;
mod statistic;

pub use build::build_indicator;
pub use definition::{DeltaType, IndicatorContext, IndicatorDefinition, TimeBinning};
pub use error::IndicatorError;
pub use period::{ALL_SEASON, Period, Season};
pub use result::{BinAxis, IndicatorAxes, IndicatorResult};
pub use statistic::{CompareOp, CustomStatistic, Statistic, StatisticRegistry};
