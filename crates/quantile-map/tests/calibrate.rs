use approx::assert_relative_eq;
use kapy_calendar::{Calendar, CfDate};
use kapy_quantile_map::{
    CalibrationSettings, Grouping, Method, QmConfig, QuantileMapError, calibrate,
};
use kapy_series::{Grid, GriddedSeries, TimeAxis};

fn daily(calendar: Calendar, start_year: i32, n_years: usize, value: f64) -> GriddedSeries {
    let start = CfDate::new(calendar, start_year, 1, 1).unwrap();
    let n_days: usize = (0..n_years)
        .map(|y| calendar.days_in_year(start_year + y as i32) as usize)
        .sum();
    let time = TimeAxis::daily(calendar, start, n_days);
    GriddedSeries::new("tas", "K", time, Grid::with_shape(1, 1), vec![value; n_days]).unwrap()
}

fn settings() -> CalibrationSettings {
    CalibrationSettings::new("tas_scaling", 1991, 2000)
        .with_out_variable("tas_bc")
        .with_config(
            QmConfig::new()
                .with_method(Method::Scaling)
                .with_grouping(Grouping::Month),
        )
}

#[test]
fn calibrates_full_simulation_on_its_own_calendar() {
    let reference = daily(Calendar::ProlepticGregorian, 1991, 10, 280.0);
    let hist_sim = daily(Calendar::NoLeap, 1981, 30, 278.0);

    let out = calibrate(&reference, &hist_sim, &settings()).unwrap();

    assert_eq!(out.name(), "tas_bc");
    assert_eq!(out.calendar(), Calendar::NoLeap);
    assert_eq!(out.n_time(), hist_sim.n_time());
    for &v in out.values() {
        assert_relative_eq!(v, 280.0, epsilon = 1e-9);
    }
    assert_eq!(out.attributes()["bias_correction_method"], "scaling");
    assert_eq!(out.attributes()["bias_correction_period"], "1991-2000");
}

#[test]
fn simulation_outside_window_is_empty() {
    let reference = daily(Calendar::NoLeap, 1991, 10, 280.0);
    let hist_sim = daily(Calendar::NoLeap, 2001, 10, 278.0);
    let result = calibrate(&reference, &hist_sim, &settings());
    assert!(matches!(result, Err(QuantileMapError::EmptyData { .. })));
}

#[test]
fn partial_reference_is_a_period_mismatch() {
    let reference = daily(Calendar::NoLeap, 1995, 6, 280.0);
    let hist_sim = daily(Calendar::NoLeap, 1981, 30, 278.0);
    let result = calibrate(&reference, &hist_sim, &settings());
    assert!(matches!(
        result,
        Err(QuantileMapError::PeriodMismatch {
            reference_start: 1995,
            historical_start: 1991,
            ..
        })
    ));
}

#[test]
fn daily_reference_meets_monthly_simulation() {
    let reference = daily(Calendar::Standard, 1991, 10, 280.0);
    let start = CfDate::new(Calendar::Day360, 1981, 1, 1).unwrap();
    let time = TimeAxis::monthly(Calendar::Day360, start, 30 * 12);
    let hist_sim =
        GriddedSeries::new("tas", "K", time, Grid::with_shape(1, 1), vec![278.0; 360]).unwrap();

    let out = calibrate(&reference, &hist_sim, &settings()).unwrap();

    assert_eq!(out.calendar(), Calendar::Day360);
    assert_eq!(out.n_time(), 360);
    assert!(out.time().dates().iter().all(|d| d.day() == 1));
    for &v in out.values() {
        assert_relative_eq!(v, 280.0, epsilon = 1e-9);
    }
}
