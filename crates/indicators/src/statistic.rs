//! Statistics that reduce one time bin to a value per cell.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use kapy_series::GriddedSeries;
use kapy_stats::{nan_max, nan_mean, nan_min};

use crate::error::IndicatorError;

/// Comparison used by [`Statistic::Count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    /// Returns the operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    /// Evaluates `left <op> right`; always false for a missing `left`.
    pub fn holds(self, left: f64, right: f64) -> bool {
        if left.is_nan() {
            return false;
        }
        match self {
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
        }
    }
}

impl FromStr for CompareOp {
    type Err = IndicatorError;

    /// Accepts symbols (`>`, `>=`, ...) and their two-letter names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            ">" | "gt" => Ok(CompareOp::Gt),
            ">=" | "ge" => Ok(CompareOp::Ge),
            "<" | "lt" => Ok(CompareOp::Lt),
            "<=" | "le" => Ok(CompareOp::Le),
            "==" | "eq" => Ok(CompareOp::Eq),
            "!=" | "ne" => Ok(CompareOp::Ne),
            _ => Err(IndicatorError::UnknownOperator { op: s.to_string() }),
        }
    }
}

/// Reduction applied to the time steps of one bin.
#[derive(Debug, Clone, PartialEq)]
pub enum Statistic {
    /// Arithmetic mean.
    Mean,
    /// Number of time steps satisfying `value <op> threshold`, averaged
    /// over the calendar years of the bin.
    Count { op: CompareOp, threshold: f64 },
    /// Maximum over the bin.
    Max,
    /// Minimum over the bin.
    Min,
    /// Maximum of each calendar year, averaged over the years of the bin.
    MeanMax,
    /// Minimum of each calendar year, averaged over the years of the bin.
    MeanMin,
    /// A registered [`CustomStatistic`], looked up by name.
    Custom { name: String },
}

impl Statistic {
    /// Builds a statistic from its name and free-form arguments.
    ///
    /// `count` needs `op` and `threshold`; `custom` needs `name`.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError::UnknownStatistic`],
    /// [`IndicatorError::MissingArgument`],
    /// [`IndicatorError::UnknownOperator`] or
    /// [`IndicatorError::InvalidThreshold`].
    pub fn from_parts(name: &str, args: &BTreeMap<String, String>) -> Result<Self, IndicatorError> {
        let arg = |key: &str| {
            args.get(key).ok_or_else(|| IndicatorError::MissingArgument {
                statistic: name.to_string(),
                argument: key.to_string(),
            })
        };
        match name.trim().to_lowercase().as_str() {
            "mean" => Ok(Statistic::Mean),
            "max" => Ok(Statistic::Max),
            "min" => Ok(Statistic::Min),
            "meanmax" => Ok(Statistic::MeanMax),
            "meanmin" => Ok(Statistic::MeanMin),
            "count" => {
                let op = arg("op")?.parse()?;
                let text = arg("threshold")?;
                let threshold =
                    text.trim()
                        .parse::<f64>()
                        .map_err(|_| IndicatorError::InvalidThreshold {
                            value: text.clone(),
                        })?;
                Ok(Statistic::Count { op, threshold })
            }
            "custom" => Ok(Statistic::Custom {
                name: arg("name")?.clone(),
            }),
            _ => Err(IndicatorError::UnknownStatistic {
                name: name.to_string(),
            }),
        }
    }

    /// Returns the canonical name of the statistic.
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Count { .. } => "count",
            Statistic::Max => "max",
            Statistic::Min => "min",
            Statistic::MeanMax => "meanmax",
            Statistic::MeanMin => "meanmin",
            Statistic::Custom { .. } => "custom",
        }
    }

    /// Reduces one cell's bin.
    ///
    /// `years[i]` is the calendar year of `values[i]`. Custom statistics work
    /// on whole series and are not handled here.
    pub(crate) fn reduce(&self, values: &[f64], years: &[i32]) -> f64 {
        match self {
            Statistic::Mean => nan_mean(values),
            Statistic::Max => nan_max(values),
            Statistic::Min => nan_min(values),
            Statistic::Count { op, threshold } => per_year(values, years, |v| {
                v.iter().filter(|&&x| op.holds(x, *threshold)).count() as f64
            }),
            Statistic::MeanMax => per_year(values, years, nan_max),
            Statistic::MeanMin => per_year(values, years, nan_min),
            Statistic::Custom { .. } => f64::NAN,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Count { op, threshold } => {
                write!(f, "count({} {threshold})", op.symbol())
            }
            Statistic::Custom { name } => write!(f, "custom({name})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Applies `f` to each calendar year's values and averages the results,
/// skipping years where `f` is `NaN`.
fn per_year(values: &[f64], years: &[i32], f: impl Fn(&[f64]) -> f64) -> f64 {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for (&v, &y) in values.iter().zip(years) {
        by_year.entry(y).or_default().push(v);
    }
    let per: Vec<f64> = by_year.values().map(|v| f(v)).collect();
    nan_mean(&per)
}

/// A user-supplied reduction over one bin.
///
/// Receives the season-and-bin filtered series and returns one value per
/// grid cell (in the series' cell order). Closures with the matching
/// signature implement this trait.
pub trait CustomStatistic: Send + Sync {
    /// Reduces `series` over time.
    ///
    /// # Errors
    ///
    /// Any message returned here surfaces as
    /// [`IndicatorError::CustomStatisticFailed`].
    fn evaluate(&self, series: &GriddedSeries) -> Result<Vec<f64>, String>;
}

impl<F> CustomStatistic for F
where
    F: Fn(&GriddedSeries) -> Result<Vec<f64>, String> + Send + Sync,
{
    fn evaluate(&self, series: &GriddedSeries) -> Result<Vec<f64>, String> {
        self(series)
    }
}

/// Named custom statistics available to indicator definitions.
#[derive(Clone, Default)]
pub struct StatisticRegistry {
    entries: BTreeMap<String, Arc<dyn CustomStatistic>>,
}

impl StatisticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `statistic` under `name`, replacing any previous entry.
    pub fn register(mut self, name: impl Into<String>, statistic: impl CustomStatistic + 'static) -> Self {
        self.entries.insert(name.into(), Arc::new(statistic));
        self
    }

    /// Looks up a registered statistic.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomStatistic>> {
        self.entries.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for StatisticRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
