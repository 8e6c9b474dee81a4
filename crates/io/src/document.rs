//! On-disk layout of a checkpoint.
//!
//! A checkpoint is a small self-describing dataset: shared coordinates plus
//! named variables, each listing its dimensions in storage order. Missing
//! values are stored as `null` and infinities as the strings `"inf"` and
//! `"-inf"`, so a divide delta against a zero reference survives a reload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub(crate) const TIME: &str = "time";
pub(crate) const PERIOD: &str = "periodID";
pub(crate) const SEASON: &str = "seasonID";
pub(crate) const PERCENTILE: &str = "percentile";
pub(crate) const LAT: &str = "lat";
pub(crate) const LON: &str = "lon";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_members: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    pub coords: Coords,
    pub variables: BTreeMap<String, Variable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Coords {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Vec<String>>,
    #[serde(default, rename = "periodID", skip_serializing_if = "Option::is_none")]
    pub period_id: Option<Vec<String>>,
    #[serde(default, rename = "seasonID", skip_serializing_if = "Option::is_none")]
    pub season_id: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile: Option<Vec<f64>>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Variable {
    pub units: String,
    pub dims: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    pub values: Vec<Option<Stored>>,
}

impl Document {
    /// Whether any variable is indexed by time or period.
    pub fn has_time_dimension(&self) -> bool {
        self.variables
            .values()
            .any(|v| v.dims.iter().any(|d| d == TIME || d == PERIOD))
    }
}

/// One row of an areal statistics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArealRecord {
    pub area_id: String,
    pub field: String,
    pub bin: String,
    #[serde(rename = "seasonID")]
    pub season_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,
    pub areal_statistic: String,
    pub value: Option<Stored>,
}

/// Rounding beyond this many places is below `f64` resolution anyway.
const MAX_DECIMALS: u32 = 15;

/// One non-missing stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Stored {
    Number(f64),
    /// `"inf"` or `"-inf"`.
    Special(String),
}

/// `NaN` becomes `None` and infinities their string form; finite values are
/// rounded to `decimals` places (at most 15) when given.
pub(crate) fn encode(values: &[f64], decimals: Option<u32>) -> Vec<Option<Stored>> {
    let scale = decimals.map(|d| 10f64.powi(d.min(MAX_DECIMALS) as i32));
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                return None;
            }
            if v.is_infinite() {
                let text = if v > 0.0 { "inf" } else { "-inf" };
                return Some(Stored::Special(text.to_string()));
            }
            let rounded = match scale {
                Some(s) => (v * s).round() / s,
                None => v,
            };
            // Huge values overflow when scaled; keep them as they are.
            Some(Stored::Number(if rounded.is_finite() { rounded } else { v }))
        })
        .collect()
}

/// Inverse of [`encode`].
///
/// # Errors
///
/// Returns the offending text for a string other than `inf` or `-inf`.
pub(crate) fn decode(values: &[Option<Stored>]) -> Result<Vec<f64>, String> {
    values
        .iter()
        .map(|v| match v {
            None => Ok(f64::NAN),
            Some(Stored::Number(x)) => Ok(*x),
            Some(Stored::Special(text)) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(format!("unexpected value {other:?}")),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_are_null() {
        let encoded = encode(&[1.0, f64::NAN], None);
        assert_eq!(encoded, vec![Some(Stored::Number(1.0)), None]);
        let json = serde_json::to_string(&encoded).unwrap();
        assert_eq!(json, "[1.0,null]");
        let back = decode(&encoded).unwrap();
        assert_eq!(back[0], 1.0);
        assert!(back[1].is_nan());
    }

    #[test]
    fn infinities_survive_a_round_trip() {
        let encoded = encode(&[f64::INFINITY, f64::NEG_INFINITY, 2.0], Some(1));
        let json = serde_json::to_string(&encoded).unwrap();
        assert_eq!(json, r#"["inf","-inf",2.0]"#);
        let parsed: Vec<Option<Stored>> = serde_json::from_str(&json).unwrap();
        assert_eq!(
            decode(&parsed).unwrap(),
            vec![f64::INFINITY, f64::NEG_INFINITY, 2.0]
        );
    }

    #[test]
    fn integers_and_unknown_text() {
        let parsed: Vec<Option<Stored>> = serde_json::from_str("[280, null]").unwrap();
        assert_eq!(decode(&parsed).unwrap()[0], 280.0);
        let bad: Vec<Option<Stored>> = serde_json::from_str(r#"["warm"]"#).unwrap();
        assert!(decode(&bad).unwrap_err().contains("warm"));
    }

    #[test]
    fn rounding_to_decimals() {
        assert_eq!(encode(&[1.23456], Some(2)), vec![Some(Stored::Number(1.23))]);
    }

    #[test]
    fn huge_decimals_are_clamped() {
        assert_eq!(encode(&[1.25], Some(u32::MAX)), vec![Some(Stored::Number(1.25))]);
        assert_eq!(encode(&[1e307], Some(5)), vec![Some(Stored::Number(1e307))]);
    }

    #[test]
    fn unknown_fields_rejected() {
        let json = r#"{"coords": {"lat": [], "lon": []}, "variables": {}, "extra": 1}"#;
        assert!(serde_json::from_str::<Document>(json).is_err());
    }
}
