//! Weighted spatial statistics.
//!
//! Reduces indicator results and ensemble statistics over the cells of
//! their grid, per bin and season, into a flat table of area means and
//! standard deviations. Weights are uniform, `cos(latitude)` or explicit,
//! optionally restricted to a mask that defines an area.
//!
//! Missing cell values are skipped; the standard deviation is the weighted
//! population standard deviation.
//!
//! # Quick Start
//!
//! ```no_run
//! use kapy_areal::{AreaWeights, areal_statistics};
//! # fn result() -> kapy_indicators::IndicatorResult { unimplemented!() }
//!
//! let result = result();
//! let whole = AreaWeights::cos_latitude(result.axes().grid());
//! for row in areal_statistics(&result, &[whole]).unwrap() {
//!     println!("{} {} {} {}", row.field, row.bin, row.statistic.name(), row.value);
//! }
//! ```

mod error;
mod statistics;
mod weights;

pub use error::ArealError;
pub use statistics::{ArealRow, ArealSource, ArealStatistic, Layer, areal_statistics};
pub use weights::{AreaWeights, WHOLE_DOMAIN};
