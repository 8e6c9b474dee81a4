//! Statistical helper functions for the kapy pipeline.
//!
//! Everything here treats `NaN` as a missing value. Functions named `nan_*`
//! skip missing values and return `NaN` when nothing is left to reduce.

use std::cmp::Ordering;

/// Number of non-missing values.
pub fn count_valid(data: &[f64]) -> usize {
    data.iter().filter(|v| !v.is_nan()).count()
}

/// Mean of the non-missing values, `NaN` if there are none.
pub fn nan_mean(data: &[f64]) -> f64 {
    let (sum, n) = data
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Population standard deviation (N denominator) of the non-missing values,
/// `NaN` if there are none.
pub fn nan_std(data: &[f64]) -> f64 {
    let m = nan_mean(data);
    if m.is_nan() {
        return f64::NAN;
    }
    let (ss, n) = data
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + (v - m) * (v - m), n + 1));
    (ss / n as f64).sqrt()
}

/// Largest non-missing value, `NaN` if there are none.
pub fn nan_max(data: &[f64]) -> f64 {
    data.iter()
        .filter(|v| !v.is_nan())
        .copied()
        .reduce(f64::max)
        .unwrap_or(f64::NAN)
}

/// Smallest non-missing value, `NaN` if there are none.
pub fn nan_min(data: &[f64]) -> f64 {
    data.iter()
        .filter(|v| !v.is_nan())
        .copied()
        .reduce(f64::min)
        .unwrap_or(f64::NAN)
}

/// The non-missing values, sorted ascending.
pub fn sorted_valid(data: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// R's default quantile algorithm (type=7).
///
/// **Expects pre-sorted input** (caller's responsibility).
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn quantile_type7(sorted: &[f64], p: f64) -> f64 {
    assert!(
        !sorted.is_empty(),
        "quantile_type7: input must not be empty"
    );
    let n = sorted.len();
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    sorted[lo] + (h - h.floor()) * (sorted[hi] - sorted[lo])
}

/// `n` quantile levels centred in `n` equal-width bins of `[0, 1]`:
/// `1/(2n), 3/(2n), ..., 1 - 1/(2n)`.
pub fn equally_spaced_nodes(n: usize) -> Vec<f64> {
    let step = 1.0 / n as f64;
    (0..n).map(|i| (i as f64 + 0.5) * step).collect()
}

/// Index of the entry of ascending `nodes` closest to `x`.
///
/// Values below the first node map to index 0 and values above the last
/// node map to the last index, which is the constant-extrapolation rule.
/// Ties between two nodes go to the lower one.
///
/// # Panics
///
/// Panics if `nodes` is empty.
pub fn nearest_index(nodes: &[f64], x: f64) -> usize {
    assert!(!nodes.is_empty(), "nearest_index: nodes must not be empty");
    let upper = nodes.partition_point(|&n| n < x);
    if upper == 0 {
        return 0;
    }
    if upper == nodes.len() {
        return nodes.len() - 1;
    }
    let lower = upper - 1;
    if x - nodes[lower] <= nodes[upper] - x {
        lower
    } else {
        upper
    }
}

/// Percentile rank of each value within `data`, in `(0, 1]`.
///
/// Ranks run from 1 to the number of non-missing values and are divided by
/// that count; ties receive the average of their ranks. Missing values keep
/// a `NaN` rank.
pub fn percentile_ranks(data: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..data.len()).filter(|&i| !data[i].is_nan()).collect();
    order.sort_by(|&a, &b| data[a].partial_cmp(&data[b]).unwrap_or(Ordering::Equal));
    let n = order.len() as f64;
    let mut ranks = vec![f64::NAN; data.len()];

    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && data[order[end]] == data[order[start]] {
            end += 1;
        }
        // Ranks start..end are 1-based start+1..=end.
        let avg = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = avg / n;
        }
        start = end;
    }
    ranks
}

/// Ordinary least-squares line `y = slope * x + intercept` through the pairs
/// where both values are finite.
///
/// Returns `None` for fewer than 2 pairs or a constant `x`.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(xi, yi)| (*xi, *yi))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx: f64 = pairs.iter().map(|(xi, _)| xi).sum::<f64>() / n;
    let my: f64 = pairs.iter().map(|(_, yi)| yi).sum::<f64>() / n;

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for &(xi, yi) in &pairs {
        let dx = xi - mx;
        sum_xy += dx * (yi - my);
        sum_xx += dx * dx;
    }

    if sum_xx == 0.0 {
        return None;
    }

    let slope = sum_xy / sum_xx;
    Some((slope, my - slope * mx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nan_mean_skips_missing() {
        assert_relative_eq!(nan_mean(&[1.0, f64::NAN, 3.0]), 2.0);
        assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
        assert!(nan_mean(&[]).is_nan());
    }

    #[test]
    fn test_nan_std_population() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0, f64::NAN];
        assert_relative_eq!(nan_std(&data), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_extremes_and_count() {
        let data = [f64::NAN, -1.0, 4.0, 2.0];
        assert_eq!(nan_max(&data), 4.0);
        assert_eq!(nan_min(&data), -1.0);
        assert_eq!(count_valid(&data), 3);
        assert!(nan_max(&[f64::NAN]).is_nan());
    }

    #[test]
    fn test_quantile_type7() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(quantile_type7(&sorted, 0.25), 2.0, epsilon = 1e-6);
        assert_relative_eq!(quantile_type7(&sorted, 0.1), 1.4, epsilon = 1e-10);
    }

    #[test]
    fn test_quantile_type7_r_crossvalidation() {
        // R: quantile(1:10, 0.3, type=7) = 3.7
        let sorted: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        assert_relative_eq!(quantile_type7(&sorted, 0.3), 3.7, epsilon = 1e-10);
    }

    #[test]
    #[should_panic(expected = "quantile_type7: input must not be empty")]
    fn test_quantile_type7_empty_panics() {
        quantile_type7(&[], 0.5);
    }

    #[test]
    fn test_equally_spaced_nodes() {
        let q = equally_spaced_nodes(4);
        assert_eq!(q.len(), 4);
        assert_relative_eq!(q[0], 0.125);
        assert_relative_eq!(q[3], 0.875);
    }

    #[test]
    fn test_nearest_index() {
        let nodes = [0.0, 1.0, 3.0];
        assert_eq!(nearest_index(&nodes, -10.0), 0);
        assert_eq!(nearest_index(&nodes, 0.4), 0);
        assert_eq!(nearest_index(&nodes, 0.5), 0);
        assert_eq!(nearest_index(&nodes, 2.1), 2);
        assert_eq!(nearest_index(&nodes, 1.0), 1);
        assert_eq!(nearest_index(&nodes, 99.0), 2);
    }

    #[test]
    fn test_percentile_ranks_with_ties() {
        let r = percentile_ranks(&[30.0, 10.0, f64::NAN, 20.0, 20.0]);
        assert_relative_eq!(r[0], 1.0);
        assert_relative_eq!(r[1], 0.25);
        assert!(r[2].is_nan());
        assert_relative_eq!(r[3], 0.625);
        assert_relative_eq!(r[4], 0.625);
    }

    #[test]
    fn test_linear_fit() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, f64::NAN, 7.0];
        let (slope, intercept) = linear_fit(&x, &y).unwrap();
        assert_relative_eq!(slope, 2.0, epsilon = 1e-12);
        assert_relative_eq!(intercept, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linear_fit_degenerate() {
        assert!(linear_fit(&[1.0], &[2.0]).is_none());
        assert!(linear_fit(&[1.0, 1.0], &[2.0, 3.0]).is_none());
    }
}
