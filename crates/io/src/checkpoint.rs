//! Loader and writer traits and their JSON checkpoint implementation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use kapy_areal::ArealRow;
use kapy_calendar::{Calendar, CfDate};
use kapy_ensemble::EnsembleStatistics;
use kapy_indicators::{BinAxis, DeltaType, IndicatorAxes, IndicatorResult};
use kapy_series::{GriddedSeries, Grid, TimeAxis};
use tracing::{debug, info};

use crate::document::{
    ArealRecord, Coords, Document, LAT, LON, PERCENTILE, PERIOD, SEASON, TIME, Variable, decode,
    encode,
};
use crate::error::IoError;

/// Reads a gridded series from a file.
pub trait SeriesLoader {
    /// Loads the single physical variable stored at `path`.
    fn load(&self, path: &Path) -> Result<GriddedSeries, IoError>;
}

/// Writes a gridded series to a file.
pub trait SeriesWriter {
    fn write(&self, series: &GriddedSeries, path: &Path, hints: &EncodingHints)
    -> Result<(), IoError>;
}

/// How values are encoded on write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodingHints {
    pretty: bool,
    decimals: Option<u32>,
}

impl EncodingHints {
    /// Compact output at full precision.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent the JSON output.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Round values to `decimals` decimal places.
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }

    pub fn decimals(&self) -> Option<u32> {
        self.decimals
    }
}

/// JSON checkpoint files exchanged between pipeline stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCheckpoint;

impl JsonCheckpoint {
    pub fn new() -> Self {
        Self
    }

    /// Writes an indicator result with its indicator, delta and reference
    /// cubes.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::File`] if the file cannot be written.
    pub fn write_indicator(
        &self,
        result: &IndicatorResult,
        path: &Path,
        hints: &EncodingHints,
    ) -> Result<(), IoError> {
        let axes = result.axes();
        let mut coords = axis_coords(axes);
        let bin_dim = axes.bins().dimension();
        let cube_dims = [bin_dim, SEASON, LAT, LON];

        let mut variables = BTreeMap::new();
        variables.insert(
            "indicator".to_string(),
            variable(result.units(), &cube_dims, result.indicator_values(), hints),
        );
        let delta_units = match result.delta_type() {
            DeltaType::Subtract => result.units(),
            DeltaType::Divide => "1",
        };
        variables.insert(
            "delta".to_string(),
            variable(delta_units, &cube_dims, result.delta_values(), hints),
        );
        variables.insert(
            "reference".to_string(),
            variable(result.units(), &[SEASON, LAT, LON], result.reference_values(), hints),
        );
        if let BinAxis::Times(axis) = axes.bins() {
            coords.calendar = Some(axis.calendar().name().to_string());
        }

        let document = Document {
            name: Some(result.id().to_string()),
            delta_type: Some(result.delta_type().to_string()),
            n_members: None,
            attributes: result.attributes().clone(),
            coords,
            variables,
        };
        write_json(&document, path, hints)?;
        info!(path = %path.display(), id = result.id(), "wrote indicator checkpoint");
        Ok(())
    }

    /// Loads an indicator result written by [`JsonCheckpoint::write_indicator`].
    ///
    /// # Errors
    ///
    /// - [`IoError::MissingTimeDimension`] if no variable is indexed by
    ///   `time` or `periodID`.
    /// - [`IoError::InvalidCheckpoint`] if variables or coordinates are
    ///   missing.
    pub fn load_indicator(&self, path: &Path) -> Result<IndicatorResult, IoError> {
        let document = read_json(path)?;
        if !document.has_time_dimension() {
            return Err(IoError::MissingTimeDimension {
                path: path.to_path_buf(),
            });
        }
        let invalid = |reason: String| IoError::InvalidCheckpoint {
            path: path.to_path_buf(),
            reason,
        };
        let field = |name: &str| {
            document
                .variables
                .get(name)
                .ok_or_else(|| invalid(format!("missing variable '{name}'")))
        };
        let indicator = field("indicator")?;
        let delta = field("delta")?;
        let reference = field("reference")?;

        let bins = match indicator.dims.first().map(String::as_str) {
            Some(PERIOD) => BinAxis::Periods(
                document
                    .coords
                    .period_id
                    .clone()
                    .ok_or_else(|| invalid("missing periodID coordinate".into()))?,
            ),
            Some(TIME) => BinAxis::Times(time_axis(&document.coords, path)?),
            _ => {
                return Err(IoError::MissingTimeDimension {
                    path: path.to_path_buf(),
                });
            }
        };
        let seasons = document
            .coords
            .season_id
            .clone()
            .ok_or_else(|| invalid("missing seasonID coordinate".into()))?;
        let grid = Grid::new(document.coords.lat.clone(), document.coords.lon.clone());
        let delta_type: DeltaType = document
            .delta_type
            .as_deref()
            .ok_or_else(|| invalid("missing delta_type".into()))?
            .parse()?;
        let id = document
            .name
            .clone()
            .ok_or_else(|| invalid("missing name".into()))?;

        let result = IndicatorResult::new(
            id,
            indicator.units.clone(),
            IndicatorAxes::new(bins, seasons, grid),
            decode(&indicator.values).map_err(invalid)?,
            decode(&delta.values).map_err(invalid)?,
            decode(&reference.values).map_err(invalid)?,
            delta_type,
        )?
        .with_attributes(document.attributes);
        debug!(path = %path.display(), id = result.id(), "loaded indicator checkpoint");
        Ok(result)
    }

    /// Writes every field of an ensemble.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::File`] if the file cannot be written.
    pub fn write_ensemble(
        &self,
        stats: &EnsembleStatistics,
        path: &Path,
        hints: &EncodingHints,
    ) -> Result<(), IoError> {
        let axes = stats.axes();
        let mut coords = axis_coords(axes);
        coords.percentile = Some(stats.percentiles().to_vec());
        if let BinAxis::Times(axis) = axes.bins() {
            coords.calendar = Some(axis.calendar().name().to_string());
        }
        let bin_dim = axes.bins().dimension();

        let variables = stats
            .fields()
            .iter()
            .map(|(name, values)| {
                let dims: &[&str] = if name.ends_with("_percentiles") {
                    &[bin_dim, SEASON, PERCENTILE, LAT, LON]
                } else {
                    &[bin_dim, SEASON, LAT, LON]
                };
                let units = if name.ends_with("_count") {
                    "1"
                } else {
                    stats.units()
                };
                (name.clone(), variable(units, dims, values, hints))
            })
            .collect();

        let document = Document {
            name: Some(stats.id().to_string()),
            delta_type: None,
            n_members: Some(stats.n_members()),
            attributes: stats.attributes().clone(),
            coords,
            variables,
        };
        write_json(&document, path, hints)?;
        info!(path = %path.display(), id = stats.id(), "wrote ensemble checkpoint");
        Ok(())
    }

    /// Writes an areal statistics table as a JSON array of rows.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::File`] if the file cannot be written.
    pub fn write_areal(
        &self,
        rows: &[ArealRow],
        path: &Path,
        hints: &EncodingHints,
    ) -> Result<(), IoError> {
        let records: Vec<ArealRecord> = rows
            .iter()
            .map(|row| ArealRecord {
                area_id: row.area_id.clone(),
                field: row.field.clone(),
                bin: row.bin.clone(),
                season_id: row.season.clone(),
                percentile: row.percentile,
                areal_statistic: row.statistic.name().to_string(),
                value: encode(&[row.value], hints.decimals()).pop().flatten(),
            })
            .collect();
        write_json(&records, path, hints)?;
        info!(path = %path.display(), n_rows = records.len(), "wrote areal table");
        Ok(())
    }
}

impl SeriesLoader for JsonCheckpoint {
    /// # Errors
    ///
    /// - [`IoError::MissingTimeDimension`] if the variable has no `time`
    ///   dimension.
    /// - [`IoError::InvalidCheckpoint`] unless the file holds exactly one
    ///   variable laid out as `(time, lat, lon)`.
    fn load(&self, path: &Path) -> Result<GriddedSeries, IoError> {
        let document = read_json(path)?;
        if !document.has_time_dimension() {
            return Err(IoError::MissingTimeDimension {
                path: path.to_path_buf(),
            });
        }
        let mut variables = document.variables.into_iter();
        let (name, var) = match (variables.next(), variables.next()) {
            (Some(only), None) => only,
            _ => {
                return Err(IoError::InvalidCheckpoint {
                    path: path.to_path_buf(),
                    reason: "expected exactly one variable".into(),
                });
            }
        };
        if var.dims != [TIME, LAT, LON] {
            return Err(IoError::InvalidCheckpoint {
                path: path.to_path_buf(),
                reason: format!("variable '{name}' has dims {:?}, expected [time, lat, lon]", var.dims),
            });
        }

        let time = time_axis(&document.coords, path)?;
        let grid = Grid::new(document.coords.lat, document.coords.lon);
        let values = decode(&var.values).map_err(|reason| IoError::InvalidCheckpoint {
            path: path.to_path_buf(),
            reason,
        })?;
        let series = GriddedSeries::new(name, var.units, time, grid, values)?
            .with_attributes(var.attributes);
        debug!(
            path = %path.display(),
            name = series.name(),
            n_time = series.n_time(),
            "loaded series checkpoint"
        );
        Ok(series)
    }
}

impl SeriesWriter for JsonCheckpoint {
    fn write(
        &self,
        series: &GriddedSeries,
        path: &Path,
        hints: &EncodingHints,
    ) -> Result<(), IoError> {
        let grid = series.grid();
        let coords = Coords {
            calendar: Some(series.calendar().name().to_string()),
            time: Some(series.time().dates().iter().map(ToString::to_string).collect()),
            lat: grid.lats().to_vec(),
            lon: grid.lons().to_vec(),
            ..Coords::default()
        };
        let mut var = variable(series.units(), &[TIME, LAT, LON], series.values(), hints);
        var.attributes = series.attributes().clone();

        let document = Document {
            name: None,
            delta_type: None,
            n_members: None,
            attributes: BTreeMap::new(),
            coords,
            variables: BTreeMap::from([(series.name().to_string(), var)]),
        };
        write_json(&document, path, hints)?;
        info!(path = %path.display(), name = series.name(), "wrote series checkpoint");
        Ok(())
    }
}

fn variable(units: &str, dims: &[&str], values: &[f64], hints: &EncodingHints) -> Variable {
    Variable {
        units: units.to_string(),
        dims: dims.iter().map(ToString::to_string).collect(),
        attributes: BTreeMap::new(),
        values: encode(values, hints.decimals()),
    }
}

fn axis_coords(axes: &IndicatorAxes) -> Coords {
    let mut coords = Coords {
        season_id: Some(axes.seasons().to_vec()),
        lat: axes.grid().lats().to_vec(),
        lon: axes.grid().lons().to_vec(),
        ..Coords::default()
    };
    match axes.bins() {
        BinAxis::Periods(ids) => coords.period_id = Some(ids.clone()),
        BinAxis::Times(_) => coords.time = Some(axes.bins().labels()),
    }
    coords
}

fn time_axis(coords: &Coords, path: &Path) -> Result<TimeAxis, IoError> {
    let Some(stamps) = &coords.time else {
        return Err(IoError::MissingTimeDimension {
            path: path.to_path_buf(),
        });
    };
    let calendar: Calendar = match &coords.calendar {
        Some(name) => name.parse()?,
        None => Calendar::Standard,
    };
    let dates = stamps
        .iter()
        .map(|s| CfDate::parse(calendar, s))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TimeAxis::new(calendar, dates)?)
}

fn write_json<T: serde::Serialize>(
    value: &T,
    path: &Path,
    hints: &EncodingHints,
) -> Result<(), IoError> {
    let text = if hints.pretty() {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, text).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> Result<Document, IoError> {
    let text = fs::read_to_string(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
