use approx::assert_relative_eq;
use kapy_areal::{AreaWeights, ArealError, ArealStatistic, areal_statistics};
use kapy_ensemble::{EnsembleConfig, combine_ensemble};
use kapy_indicators::{BinAxis, DeltaType, IndicatorAxes, IndicatorResult};
use kapy_series::Grid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Two periods, one season, a 2x1 grid at the equator and 60N.
fn result(offset: f64) -> IndicatorResult {
    let axes = IndicatorAxes::new(
        BinAxis::Periods(vec!["ref".into(), "far".into()]),
        vec!["all".into()],
        Grid::new(vec![0.0, 60.0], vec![10.0]),
    );
    let indicator = vec![1.0 + offset, 4.0 + offset, 2.0 + offset, f64::NAN];
    let delta = vec![0.0, 0.0, 1.0, f64::NAN];
    IndicatorResult::new(
        "tas_mean",
        "degC",
        axes,
        indicator,
        delta,
        vec![1.0 + offset, 4.0 + offset],
        DeltaType::Subtract,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// 1. cos_latitude_weighted_rows
// ---------------------------------------------------------------------------
#[test]
fn cos_latitude_weighted_rows() {
    let r = result(0.0);
    let weights = AreaWeights::cos_latitude(r.axes().grid());
    let rows = areal_statistics(&r, &[weights]).unwrap();

    // 2 fields x 2 bins x 1 season x 2 statistics.
    assert_eq!(rows.len(), 8);

    let mean_ref = rows
        .iter()
        .find(|row| {
            row.field == "indicator" && row.bin == "ref" && row.statistic == ArealStatistic::Mean
        })
        .unwrap();
    // Weights 1 and 0.5: (1 + 2) / 1.5.
    assert_relative_eq!(mean_ref.value, 2.0, epsilon = 1e-12);
    assert_eq!(mean_ref.area_id, "all");
    assert_eq!(mean_ref.season, "all");

    // Only the equator cell is valid in the far period.
    let sd_far = rows
        .iter()
        .find(|row| {
            row.field == "indicator" && row.bin == "far" && row.statistic == ArealStatistic::Sd
        })
        .unwrap();
    assert_eq!(sd_far.value, 0.0);
}

// ---------------------------------------------------------------------------
// 2. mask_defines_area
// ---------------------------------------------------------------------------
#[test]
fn mask_defines_area() {
    let r = result(0.0);
    let north = AreaWeights::uniform(r.axes().grid())
        .with_mask("north", &[false, true])
        .unwrap();
    let rows = areal_statistics(&r, &[north]).unwrap();

    let far = rows
        .iter()
        .find(|row| row.field == "indicator" && row.bin == "far" && row.statistic == ArealStatistic::Mean)
        .unwrap();
    assert_eq!(far.area_id, "north");
    assert!(far.value.is_nan());

    let reference = rows
        .iter()
        .find(|row| row.field == "indicator" && row.bin == "ref" && row.statistic == ArealStatistic::Mean)
        .unwrap();
    assert_eq!(reference.value, 4.0);
}

// ---------------------------------------------------------------------------
// 3. ensemble_percentile_layers
// ---------------------------------------------------------------------------
#[test]
fn ensemble_percentile_layers() {
    let members = vec![result(0.0), result(1.0), result(2.0)];
    let config = EnsembleConfig::new().with_percentiles(vec![50.0]);
    let stats = combine_ensemble(&members, &config).unwrap();
    let weights = AreaWeights::uniform(stats.axes().grid());
    let rows = areal_statistics(&stats, &[weights]).unwrap();

    let median = rows
        .iter()
        .find(|row| {
            row.field == "indicator_percentiles"
                && row.bin == "ref"
                && row.statistic == ArealStatistic::Mean
        })
        .unwrap();
    assert_eq!(median.percentile, Some(50.0));
    // Member medians are 2 and 5.
    assert_relative_eq!(median.value, 3.5, epsilon = 1e-12);

    let count = rows
        .iter()
        .find(|row| row.field == "indicator_count" && row.bin == "far" && row.statistic == ArealStatistic::Mean)
        .unwrap();
    // Counts 3 and 0.
    assert_relative_eq!(count.value, 1.5);
    assert!(rows.iter().all(|row| row.field.ends_with("_percentiles") == row.percentile.is_some()));
}

// ---------------------------------------------------------------------------
// 4. weights_must_match_grid
// ---------------------------------------------------------------------------
#[test]
fn weights_must_match_grid() {
    let r = result(0.0);
    let wrong = AreaWeights::from_values("basin", vec![1.0; 3]).unwrap();
    assert!(matches!(
        areal_statistics(&r, &[wrong]),
        Err(ArealError::WeightsLength { expected: 2, got: 3, .. })
    ));
}
