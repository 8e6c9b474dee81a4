use kapy_calendar::{Calendar, CfDate};
use kapy_series::{GriddedSeries, Grid, SeriesError, TimeAxis};

fn daily_series(calendar: Calendar, start_year: i32, n_years: i32, grid: Grid) -> GriddedSeries {
    let start = CfDate::new(calendar, start_year, 1, 1).unwrap();
    let n: usize = (start_year..start_year + n_years)
        .map(|y| calendar.days_in_year(y) as usize)
        .sum();
    let time = TimeAxis::daily(calendar, start, n);
    let n_cells = grid.n_cells();
    let values = (0..n * n_cells).map(|i| (i / n_cells) as f64).collect();
    GriddedSeries::new("tas", "K", time, grid, values).unwrap()
}

// ---------------------------------------------------------------------------
// Calendar alignment of a model series onto an observation calendar
// ---------------------------------------------------------------------------

#[test]
fn model_360_onto_standard_keeps_grid() {
    let model = daily_series(Calendar::Day360, 2001, 2, Grid::with_shape(2, 3));
    let aligned = model.convert_calendar(Calendar::Standard);
    assert_eq!(aligned.calendar(), Calendar::Standard);
    assert_eq!(aligned.n_time(), 720);
    assert_eq!(aligned.grid().shape(), (2, 3));
    assert_eq!(aligned.time().dates()[359].to_string(), "2001-12-31");
}

#[test]
fn daily_to_monthly_then_slice() {
    let obs = daily_series(Calendar::NoLeap, 1991, 3, Grid::with_shape(1, 1));
    let monthly = obs.resample_monthly_mean();
    assert_eq!(monthly.n_time(), 36);
    assert!(monthly.time().dates().iter().all(|d| d.day() == 1));
    let middle = monthly.slice_years(1992, 1992);
    assert_eq!(middle.n_time(), 12);
    assert_eq!(middle.time().year_range(), Some((1992, 1992)));
}

#[test]
fn attributes_survive_transforms() {
    let s = daily_series(Calendar::NoLeap, 2000, 1, Grid::with_shape(1, 1))
        .with_attribute("source", "model-a");
    let t = s.resample_monthly_mean().map(|v| v * 2.0);
    assert_eq!(t.attributes().get("source").map(String::as_str), Some("model-a"));
}

#[test]
fn with_values_rejects_wrong_length() {
    let s = daily_series(Calendar::NoLeap, 2000, 1, Grid::with_shape(1, 2));
    assert!(matches!(
        s.with_values(vec![0.0; 3]),
        Err(SeriesError::LengthMismatch { expected: 730, got: 3, .. })
    ));
}
