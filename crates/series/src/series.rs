//! Gridded time series: values over `(time, lat, lon)` plus metadata.

use std::collections::BTreeMap;

use kapy_calendar::Calendar;
use tracing::debug;

use crate::error::SeriesError;
use crate::grid::Grid;
use crate::time::TimeAxis;

/// A single physical variable on a `(time, lat, lon)` grid.
///
/// Values are stored row-major as `[n_time][ny][nx]`, i.e. the value of cell
/// `c` at time step `t` lives at `t * n_cells + c`. Missing data is `NaN`.
/// Every transform returns a new series; nothing mutates in place.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedSeries {
    name: String,
    units: String,
    time: TimeAxis,
    grid: Grid,
    values: Vec<f64>,
    attributes: BTreeMap<String, String>,
}

impl GriddedSeries {
    /// Creates a series from row-major `(time, lat, lon)` values.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::LengthMismatch`] if `values.len()` is not
    /// `time.len() * grid.n_cells()`.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        time: TimeAxis,
        grid: Grid,
        values: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        let name = name.into();
        let expected = time.len() * grid.n_cells();
        if values.len() != expected {
            return Err(SeriesError::LengthMismatch {
                name,
                expected,
                got: values.len(),
            });
        }
        Ok(Self {
            name,
            units: units.into(),
            time,
            grid,
            values,
            attributes: BTreeMap::new(),
        })
    }

    /// Creates a series from one time series per cell.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::LengthMismatch`] if the number of cells does not
    /// match the grid or a cell's length does not match the time axis.
    pub fn from_cells(
        name: impl Into<String>,
        units: impl Into<String>,
        time: TimeAxis,
        grid: Grid,
        cells: &[Vec<f64>],
    ) -> Result<Self, SeriesError> {
        let name = name.into();
        let n_cells = grid.n_cells();
        if cells.len() != n_cells {
            return Err(SeriesError::LengthMismatch {
                name: format!("{name} cells"),
                expected: n_cells,
                got: cells.len(),
            });
        }
        let nt = time.len();
        if let Some(bad) = cells.iter().find(|c| c.len() != nt) {
            return Err(SeriesError::LengthMismatch {
                name: format!("{name} cell series"),
                expected: nt,
                got: bad.len(),
            });
        }
        let mut values = vec![f64::NAN; nt * n_cells];
        for (c, series) in cells.iter().enumerate() {
            for (t, &v) in series.iter().enumerate() {
                values[t * n_cells + c] = v;
            }
        }
        Self::new(name, units, time, grid, values)
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical units.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Time axis.
    pub fn time(&self) -> &TimeAxis {
        &self.time
    }

    /// Calendar of the time axis.
    pub fn calendar(&self) -> Calendar {
        self.time.calendar()
    }

    /// Spatial grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Row-major `(time, lat, lon)` values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consumes the series and returns its values.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Provenance attributes.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Number of time steps.
    pub fn n_time(&self) -> usize {
        self.time.len()
    }

    /// Number of grid cells.
    pub fn n_cells(&self) -> usize {
        self.grid.n_cells()
    }

    /// Value of `cell` at time step `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` or `cell` is out of range.
    pub fn value(&self, t: usize, cell: usize) -> f64 {
        self.values[t * self.n_cells() + cell]
    }

    /// The time series of one cell.
    pub fn cell_values(&self, cell: usize) -> Vec<f64> {
        let n_cells = self.n_cells();
        self.values
            .iter()
            .skip(cell)
            .step_by(n_cells.max(1))
            .copied()
            .collect()
    }

    /// The time series of every cell, in cell order.
    pub fn cells(&self) -> Vec<Vec<f64>> {
        (0..self.n_cells()).map(|c| self.cell_values(c)).collect()
    }

    /// Returns a copy with a different variable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns a copy with different units.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Returns a copy with one attribute set.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns a copy with the attribute map replaced.
    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Same axes and metadata, new values.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::LengthMismatch`] if `values` has the wrong length.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self, SeriesError> {
        if values.len() != self.values.len() {
            return Err(SeriesError::LengthMismatch {
                name: self.name.clone(),
                expected: self.values.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            values,
            ..self.clone_metadata()
        })
    }

    /// Applies `f` to every value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            values: self.values.iter().map(|&v| f(v)).collect(),
            ..self.clone_metadata()
        }
    }

    /// Combines two series value by value.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::ShapeMismatch`] or [`SeriesError::TimeMismatch`]
    /// if the series are not on the same grid and time steps.
    pub fn zip_with(
        &self,
        other: &GriddedSeries,
        context: &str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self, SeriesError> {
        self.check_same_grid(other, context)?;
        if self.n_time() != other.n_time() {
            return Err(SeriesError::TimeMismatch {
                context: context.to_string(),
                left: self.n_time(),
                right: other.n_time(),
            });
        }
        Ok(Self {
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
            ..self.clone_metadata()
        })
    }

    /// Keeps only the time steps at `indices` (increasing).
    pub fn select_times(&self, indices: &[usize]) -> Self {
        let n_cells = self.n_cells();
        let mut values = Vec::with_capacity(indices.len() * n_cells);
        for &t in indices {
            values.extend_from_slice(&self.values[t * n_cells..(t + 1) * n_cells]);
        }
        Self {
            name: self.name.clone(),
            units: self.units.clone(),
            time: self.time.select(indices),
            grid: self.grid.clone(),
            values,
            attributes: self.attributes.clone(),
        }
    }

    /// Keeps the time steps whose year lies in `start..=end`.
    pub fn slice_years(&self, start: i32, end: i32) -> Self {
        self.select_times(&self.time.indices_in_years(start, end))
    }

    /// Moves the series onto `target`'s calendar, dropping time steps that
    /// have no counterpart (see [`kapy_calendar::convert_dates`]).
    pub fn convert_calendar(&self, target: Calendar) -> Self {
        if self.calendar() == target {
            return self.clone();
        }
        let (axis, kept) = self.time.convert(target);
        debug!(
            variable = %self.name,
            from = %self.calendar(),
            to = %target,
            dropped = self.n_time() - kept.len(),
            "converted calendar"
        );
        let selected = self.select_times(&kept);
        Self {
            time: axis,
            ..selected
        }
    }

    /// Returns `true` if the series has at most one step per calendar month.
    pub fn is_monthly(&self) -> bool {
        self.time.is_monthly()
    }

    /// The series at monthly resolution: itself if already monthly,
    /// otherwise its [monthly mean](Self::resample_monthly_mean).
    pub fn to_monthly(&self) -> Self {
        if self.is_monthly() {
            self.clone()
        } else {
            debug!(variable = %self.name, n_time = self.n_time(), "resampling to monthly means");
            self.resample_monthly_mean()
        }
    }

    /// Averages each calendar month, ignoring `NaN`; the output stamps are
    /// the first of each month.
    pub fn resample_monthly_mean(&self) -> Self {
        let n_cells = self.n_cells();
        let dates = self.time.dates();
        let mut out_dates = Vec::new();
        let mut values = Vec::new();

        let mut start = 0;
        while start < dates.len() {
            let key = (dates[start].year(), dates[start].month());
            let mut end = start;
            while end < dates.len() && (dates[end].year(), dates[end].month()) == key {
                end += 1;
            }
            for c in 0..n_cells {
                let (sum, n) = (start..end)
                    .map(|t| self.values[t * n_cells + c])
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                values.push(if n == 0 { f64::NAN } else { sum / n as f64 });
            }
            out_dates.push(dates[start].first_of_month());
            start = end;
        }

        Self {
            time: TimeAxis::from_parts(self.calendar(), out_dates),
            values,
            ..self.clone_metadata()
        }
    }

    /// Fails unless `other` is on a grid of the same shape.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::ShapeMismatch`] naming `context`.
    pub fn check_same_grid(&self, other: &GriddedSeries, context: &str) -> Result<(), SeriesError> {
        let (left_ny, left_nx) = self.grid.shape();
        let (right_ny, right_nx) = other.grid.shape();
        if (left_ny, left_nx) != (right_ny, right_nx) {
            return Err(SeriesError::ShapeMismatch {
                context: context.to_string(),
                left_ny,
                left_nx,
                right_ny,
                right_nx,
            });
        }
        Ok(())
    }

    /// Fails unless `other` carries the same units.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::UnitsMismatch`] naming this series' variable.
    pub fn check_units(&self, other: &GriddedSeries) -> Result<(), SeriesError> {
        if self.units != other.units {
            return Err(SeriesError::UnitsMismatch {
                variable: self.name.clone(),
                expected: self.units.clone(),
                got: other.units.clone(),
            });
        }
        Ok(())
    }

    fn clone_metadata(&self) -> Self {
        Self {
            name: self.name.clone(),
            units: self.units.clone(),
            time: self.time.clone(),
            grid: self.grid.clone(),
            values: Vec::new(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Brings two series onto a common time resolution.
///
/// When exactly one of them is monthly, the other is resampled to monthly
/// means on first-of-month stamps; otherwise both are returned unchanged.
pub fn match_resolution(left: &GriddedSeries, right: &GriddedSeries) -> (GriddedSeries, GriddedSeries) {
    if left.is_monthly() != right.is_monthly() {
        (left.to_monthly(), right.to_monthly())
    } else {
        (left.clone(), right.clone())
    }
}
