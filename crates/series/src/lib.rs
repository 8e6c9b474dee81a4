//! # kapy-series
//!
//! The shared data abstraction of the pipeline: one physical variable on a
//! `(time, lat, lon)` grid, tagged with units, a calendar-aware time axis and
//! free-form provenance attributes.
//!
//! All series taking part in one joint operation (training, deltas, ensemble
//! merges) must share the same grid shape; [`GriddedSeries::check_same_grid`]
//! and [`GriddedSeries::check_units`] enforce that at stage boundaries.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `grid` | Rectilinear lat/lon grid |
//! | `time` | Calendar-tagged time axis |
//! | `series` | `GriddedSeries` and its transforms |
//! | `derived` | Derived variables built from input series |
//! | `error` | Error types |

mod derived;
mod error;
mod grid;
mod series;
mod time;

pub use derived::{
    DeriveError, DerivedRegistry, DerivedVariable, DiurnalRange, SaturationVapourPressure,
    derive_variable,
};
pub use error::SeriesError;
pub use grid::Grid;
pub use series::{GriddedSeries, match_resolution};
pub use time::TimeAxis;
