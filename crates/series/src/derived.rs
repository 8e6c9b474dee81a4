//! Derived (secondary) variables built from one or more input series.
//!
//! A [`DerivedVariable`] is a named processor: it declares the inputs it
//! needs, receives them keyed by name together with free-form string
//! arguments, and returns a new series. Processors live in a
//! [`DerivedRegistry`]; [`DerivedRegistry::with_builtins`] provides
//! `diurnal_range` and `saturation_vapour_pressure`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::error::SeriesError;
use crate::series::GriddedSeries;

/// Offset between kelvin and degrees Celsius.
const KELVIN_OFFSET: f64 = 273.15;

/// A processor turning input series into one derived series.
pub trait DerivedVariable: Send + Sync {
    /// Names of the inputs [`derive`](Self::derive) reads.
    fn inputs(&self) -> Vec<String>;

    /// Units of the output for the given inputs.
    fn units(&self, inputs: &BTreeMap<String, GriddedSeries>) -> String;

    /// Builds the derived values.
    ///
    /// `inputs` holds at least every name of [`inputs`](Self::inputs).
    ///
    /// # Errors
    ///
    /// A message returned here surfaces as
    /// [`SeriesError::DerivationFailed`]; series errors propagate unchanged.
    fn derive(
        &self,
        inputs: &BTreeMap<String, GriddedSeries>,
        args: &BTreeMap<String, String>,
    ) -> Result<GriddedSeries, DeriveError>;
}

/// Failure inside a processor.
#[derive(Debug, thiserror::Error)]
pub enum DeriveError {
    /// The processor rejected its inputs or arguments.
    #[error("{0}")]
    Rejected(String),
    /// A series operation failed.
    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// `tasmax - tasmin`, in the units of the inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiurnalRange;

impl DerivedVariable for DiurnalRange {
    fn inputs(&self) -> Vec<String> {
        vec!["tasmax".to_string(), "tasmin".to_string()]
    }

    fn units(&self, inputs: &BTreeMap<String, GriddedSeries>) -> String {
        inputs
            .get("tasmax")
            .map(|s| s.units().to_string())
            .unwrap_or_default()
    }

    fn derive(
        &self,
        inputs: &BTreeMap<String, GriddedSeries>,
        _args: &BTreeMap<String, String>,
    ) -> Result<GriddedSeries, DeriveError> {
        let (tasmax, tasmin) = (&inputs["tasmax"], &inputs["tasmin"]);
        tasmax.check_units(tasmin)?;
        Ok(tasmax.zip_with(tasmin, "diurnal_range", |hi, lo| hi - lo)?)
    }
}

/// Saturation vapour pressure over water in hPa from `tas`, using the
/// Magnus formula `6.112 * exp(17.62 T / (243.12 + T))` with `T` in degC.
///
/// `tas` may be in `K` or `degC`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaturationVapourPressure;

impl DerivedVariable for SaturationVapourPressure {
    fn inputs(&self) -> Vec<String> {
        vec!["tas".to_string()]
    }

    fn units(&self, _inputs: &BTreeMap<String, GriddedSeries>) -> String {
        "hPa".to_string()
    }

    fn derive(
        &self,
        inputs: &BTreeMap<String, GriddedSeries>,
        _args: &BTreeMap<String, String>,
    ) -> Result<GriddedSeries, DeriveError> {
        let tas = &inputs["tas"];
        let offset = match tas.units() {
            "K" => KELVIN_OFFSET,
            "degC" | "C" | "°C" => 0.0,
            other => {
                return Err(DeriveError::Rejected(format!(
                    "tas must be in K or degC, got '{other}'"
                )));
            }
        };
        Ok(tas.map(|t| {
            let c = t - offset;
            6.112 * (17.62 * c / (243.12 + c)).exp()
        }))
    }
}

/// Named processors available to derived-variable definitions.
#[derive(Clone, Default)]
pub struct DerivedRegistry {
    entries: BTreeMap<String, Arc<dyn DerivedVariable>>,
}

impl DerivedRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `diurnal_range` and `saturation_vapour_pressure`.
    pub fn with_builtins() -> Self {
        Self::new()
            .register("diurnal_range", DiurnalRange)
            .register("saturation_vapour_pressure", SaturationVapourPressure)
    }

    /// Registers `processor` under `name`, replacing any previous entry.
    pub fn register(
        mut self,
        name: impl Into<String>,
        processor: impl DerivedVariable + 'static,
    ) -> Self {
        self.entries.insert(name.into(), Arc::new(processor));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn DerivedVariable>> {
        self.entries.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for DerivedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// Builds derived variable `id` with the registered `processor`.
///
/// The output is named `id`, carries the processor's units and records the
/// processor and its inputs in the `derived_processor` and `derived_inputs`
/// attributes. Attributes shared by every input are kept.
///
/// # Errors
///
/// - [`SeriesError::UnknownProcessor`] if `processor` is not registered.
/// - [`SeriesError::MissingInput`] if a required input is absent.
/// - [`SeriesError::DerivationFailed`] if the processor rejects its input.
#[tracing::instrument(skip(registry, inputs, args))]
pub fn derive_variable(
    registry: &DerivedRegistry,
    id: &str,
    processor: &str,
    inputs: &BTreeMap<String, GriddedSeries>,
    args: &BTreeMap<String, String>,
) -> Result<GriddedSeries, SeriesError> {
    let handler = registry
        .get(processor)
        .ok_or_else(|| SeriesError::UnknownProcessor {
            name: processor.to_string(),
        })?;
    let required = handler.inputs();
    if let Some(missing) = required.iter().find(|name| !inputs.contains_key(*name)) {
        return Err(SeriesError::MissingInput {
            variable: id.to_string(),
            input: missing.clone(),
        });
    }

    let derived = handler.derive(inputs, args).map_err(|e| match e {
        DeriveError::Rejected(reason) => SeriesError::DerivationFailed {
            variable: id.to_string(),
            reason,
        },
        DeriveError::Series(e) => e,
    })?;

    let mut attributes = required
        .first()
        .map(|name| inputs[name].attributes().clone())
        .unwrap_or_default();
    for name in required.iter().skip(1) {
        attributes.retain(|k, v| inputs[name].attributes().get(k) == Some(v));
    }
    attributes.insert("derived_processor".to_string(), processor.to_string());
    attributes.insert("derived_inputs".to_string(), required.join(","));

    let out = derived
        .with_name(id)
        .with_units(handler.units(inputs))
        .with_attributes(attributes);
    info!(variable = %id, n_time = out.n_time(), "derived variable built");
    Ok(out)
}
