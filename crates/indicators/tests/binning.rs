use approx::assert_relative_eq;
use kapy_calendar::{Calendar, CfDate};
use kapy_indicators::{
    BinAxis, CompareOp, DeltaType, IndicatorContext, IndicatorDefinition, IndicatorError, Period,
    Season, Statistic, StatisticRegistry, TimeBinning, build_indicator,
};
use kapy_series::{Grid, GriddedSeries, TimeAxis};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Daily 360-day series over `n_years` years from `start_year`, two cells.
///
/// Cell 0 holds the month number, cell 1 the year offset.
fn daily_360(start_year: i32, n_years: usize) -> GriddedSeries {
    let start = CfDate::new(Calendar::Day360, start_year, 1, 1).unwrap();
    let n_days = n_years * 360;
    let time = TimeAxis::daily(Calendar::Day360, start, n_days);
    let mut values = Vec::with_capacity(n_days * 2);
    for d in time.dates() {
        values.push(f64::from(d.month()));
        values.push(f64::from(d.year() - start_year));
    }
    GriddedSeries::new("tas", "K", time, Grid::with_shape(1, 2), values).unwrap()
}

fn context() -> IndicatorContext {
    IndicatorContext::new(vec![
        Period::new("hist", "1991-1995", 1991, 1995).unwrap(),
        Period::new("near", "1996-2000", 1996, 2000).unwrap(),
        Period::new("far", "2071-2100", 2071, 2100).unwrap(),
    ])
    .with_season(Season::new("JJA", vec![6, 7, 8]).unwrap())
    .with_season(Season::new("DJF", vec![12, 1, 2]).unwrap())
}

// ---------------------------------------------------------------------------
// 1. empty_period_is_nan_filled
// ---------------------------------------------------------------------------
#[test]
fn empty_period_is_nan_filled() {
    let def = IndicatorDefinition::new("101", Statistic::Mean).with_seasons(["all", "JJA"]);
    let r = build_indicator(&daily_360(1991, 10), &def, &context()).unwrap();

    assert_eq!(r.axes().shape(), (3, 2, 2));
    for season in 0..2 {
        for cell in 0..2 {
            assert!(r.indicator(2, season, cell).is_nan());
            assert!(r.delta(2, season, cell).is_nan());
            assert!(!r.indicator(1, season, cell).is_nan());
        }
    }
}

// ---------------------------------------------------------------------------
// 2. seasons_filter_months
// ---------------------------------------------------------------------------
#[test]
fn seasons_filter_months() {
    let def = IndicatorDefinition::new("101", Statistic::Mean).with_seasons(["JJA", "DJF", "all"]);
    let r = build_indicator(&daily_360(1991, 10), &def, &context()).unwrap();
    assert_relative_eq!(r.indicator(0, 0, 0), 7.0);
    assert_relative_eq!(r.indicator(0, 1, 0), 5.0);
    assert_relative_eq!(r.indicator(0, 2, 0), 6.5);
    // Year offsets 0..=4 in the first period, 5..=9 in the second.
    assert_relative_eq!(r.indicator(1, 2, 1), 7.0);
    assert_relative_eq!(r.delta(1, 2, 1), 5.0);
}

// ---------------------------------------------------------------------------
// 3. count_is_per_year_average
// ---------------------------------------------------------------------------
#[test]
fn count_is_per_year_average() {
    let stat = Statistic::Count {
        op: CompareOp::Ge,
        threshold: 11.0,
    };
    let def = IndicatorDefinition::new("102", stat)
        .with_units("days")
        .with_delta_type(DeltaType::Divide);
    let r = build_indicator(&daily_360(1991, 10), &def, &context()).unwrap();
    // November and December: 60 days a year.
    assert_relative_eq!(r.indicator(0, 0, 0), 60.0);
    assert_relative_eq!(r.delta(1, 0, 0), 1.0);
    assert_eq!(r.units(), "days");
    assert_eq!(r.attributes()["statistic"], "count(>= 11)");
}

// ---------------------------------------------------------------------------
// 4. years_binning_stamps_first_of_january
// ---------------------------------------------------------------------------
#[test]
fn years_binning_stamps_first_of_january() {
    let def = IndicatorDefinition::new("103", Statistic::MeanMax)
        .with_seasons(["DJF"])
        .with_time_binning(TimeBinning::Years);
    let r = build_indicator(&daily_360(1991, 10), &def, &context()).unwrap();

    let BinAxis::Times(axis) = r.axes().bins() else {
        panic!("expected time bins");
    };
    assert_eq!(axis.len(), 10);
    assert_eq!(axis.calendar(), Calendar::Standard);
    assert!(axis.dates().iter().all(|d| d.month() == 1 && d.day() == 1));
    assert_eq!(axis.dates()[0].year(), 1991);

    // DJF maximum of the month number is 12 every year.
    assert_relative_eq!(r.indicator(4, 0, 0), 12.0);
    // Reference is the mean over 1991..=1995 of the year offset: 2.
    assert_relative_eq!(r.reference(0, 1), 2.0);
    assert_relative_eq!(r.delta(9, 0, 1), 7.0);
}

// ---------------------------------------------------------------------------
// 5. custom_statistic_receives_filtered_series
// ---------------------------------------------------------------------------
#[test]
fn custom_statistic_receives_filtered_series() {
    let registry = StatisticRegistry::new().register(
        "n_steps",
        |s: &GriddedSeries| -> Result<Vec<f64>, String> { Ok(vec![s.n_time() as f64; s.n_cells()]) },
    );
    let def = IndicatorDefinition::new(
        "104",
        Statistic::Custom {
            name: "n_steps".into(),
        },
    )
    .with_seasons(["JJA"]);
    let r = build_indicator(&daily_360(1991, 10), &def, &context().with_registry(registry)).unwrap();
    // Five years of three 30-day months.
    assert_relative_eq!(r.indicator(0, 0, 0), 450.0);
    assert!(r.indicator(2, 0, 1).is_nan());
}

// ---------------------------------------------------------------------------
// 6. custom_statistic_wrong_shape
// ---------------------------------------------------------------------------
#[test]
fn custom_statistic_wrong_shape() {
    let registry = StatisticRegistry::new().register(
        "scalar",
        |_: &GriddedSeries| -> Result<Vec<f64>, String> { Ok(vec![1.0]) },
    );
    let def = IndicatorDefinition::new(
        "105",
        Statistic::Custom {
            name: "scalar".into(),
        },
    );
    let err = build_indicator(&daily_360(1991, 10), &def, &context().with_registry(registry))
        .unwrap_err();
    assert!(matches!(err, IndicatorError::CustomStatisticFailed { ref indicator_id, .. } if indicator_id == "105"));
}

// ---------------------------------------------------------------------------
// 7. unknown_season_fails_before_binning
// ---------------------------------------------------------------------------
#[test]
fn unknown_season_fails_before_binning() {
    let def = IndicatorDefinition::new("106", Statistic::Mean).with_seasons(["MAM"]);
    assert!(matches!(
        build_indicator(&daily_360(1991, 10), &def, &context()),
        Err(IndicatorError::UnknownSeason { .. })
    ));
}

// ---------------------------------------------------------------------------
// 8. attributes_record_definition
// ---------------------------------------------------------------------------
#[test]
fn attributes_record_definition() {
    let def = IndicatorDefinition::new("107", Statistic::Min)
        .with_name("Coldest day")
        .with_seasons(["all", "DJF"]);
    let r = build_indicator(&daily_360(1991, 10), &def, &context()).unwrap();
    let attrs = r.attributes();
    assert_eq!(attrs["id"], "107");
    assert_eq!(attrs["name"], "Coldest day");
    assert_eq!(attrs["seasons"], "all,DJF");
    assert_eq!(attrs["time_binning"], "periods");
    assert_eq!(attrs["delta_type"], "subtract");
    assert_eq!(attrs["source_variable"], "tas");
    assert_eq!(r.units(), "K");
}
