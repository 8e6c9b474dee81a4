//! Indicator command: bin one series into periods or years and seasons.

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use kapy_indicators::build_indicator;
use kapy_io::{JsonCheckpoint, SeriesLoader};

use crate::cli::IndicatorArgs;
use crate::config::KapyConfig;
use crate::convert;

/// Run the indicator pipeline.
pub fn run(args: IndicatorArgs, config: &KapyConfig) -> Result<()> {
    let _cmd = info_span!("indicator", id = %args.id).entered();
    // 1. Resolve definition
    let ind = config
        .indicators
        .get(&args.id)
        .with_context(|| format!("no [indicators.{}] section in config", args.id))?;
    let definition = convert::build_definition(&args.id, ind)?;
    let context = convert::build_context(config)?;

    // 2. Load series
    let checkpoint = JsonCheckpoint::new();
    let series = checkpoint
        .load(&args.input)
        .with_context(|| format!("failed to load: {}", args.input.display()))?;
    convert::check_series_units(&convert::declared_units(&config.inputs)?, &series)?;
    if series.name() != ind.variable {
        warn!(
            expected = %ind.variable,
            got = series.name(),
            "series name differs from the indicator variable"
        );
    }

    // 3. Compute
    let result = build_indicator(&series, &definition, &context)
        .with_context(|| format!("indicator '{}' failed", args.id))?;

    // 4. Write
    checkpoint
        .write_indicator(&result, &args.output, &convert::build_hints(&config.output))
        .with_context(|| format!("failed to write: {}", args.output.display()))?;
    info!(path = %args.output.display(), "indicator written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kapy_calendar::{Calendar, CfDate};
    use kapy_io::{EncodingHints, SeriesWriter};
    use kapy_series::{GriddedSeries, Grid, TimeAxis};

    #[test]
    fn writes_period_means_and_deltas() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tas.json");
        let output = dir.path().join("tas_mean.json");

        let start = CfDate::new(Calendar::Standard, 1991, 1, 1).unwrap();
        let time = TimeAxis::monthly(Calendar::Standard, start, 240);
        let values = time.years().iter().map(|&y| f64::from(y - 1990)).collect();
        let series =
            GriddedSeries::new("tas", "K", time, Grid::new(vec![46.0], vec![7.0]), values).unwrap();
        JsonCheckpoint::new()
            .write(&series, &input, &EncodingHints::new())
            .unwrap();

        let config: KapyConfig = toml::from_str(
            r#"
            [[periods]]
            id = "ref"
            start = 1991
            end = 2000

            [[periods]]
            id = "next"
            start = 2001
            end = 2010

            [[inputs]]
            variable = "tas"
            units = "K"

            [indicators.tas_mean]
            variable = "tas"
            "#,
        )
        .unwrap();
        let args = IndicatorArgs {
            id: "tas_mean".into(),
            input,
            output: output.clone(),
        };
        run(args, &config).unwrap();

        let result = JsonCheckpoint::new().load_indicator(&output).unwrap();
        assert_eq!(result.indicator(0, 0, 0), 5.5);
        assert_eq!(result.indicator(1, 0, 0), 15.5);
        assert_eq!(result.delta(1, 0, 0), 10.0);
        assert_eq!(result.attributes().get("source_variable").map(String::as_str), Some("tas"));
    }

    #[test]
    fn undeclared_indicator_id_fails() {
        let config: KapyConfig = toml::from_str("").unwrap();
        let args = IndicatorArgs {
            id: "missing".into(),
            input: "in.json".into(),
            output: "out.json".into(),
        };
        let err = run(args, &config).unwrap_err();
        assert!(err.to_string().contains("[indicators.missing]"));
    }
}
