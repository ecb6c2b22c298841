//! Pairwise Pearson correlation over optionally-missing numeric views.

use crate::frame::Dataset;

/// Pearson correlation over rows where both values are present.
/// None when fewer than 3 complete pairs or either side is constant.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 3 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then_some(r)
}

/// Correlation between two dataset columns by name.
/// None when either column is absent or non-numeric.
pub fn column_correlation(dataset: &Dataset, a: &str, b: &str) -> Option<f64> {
    let xs = dataset.numeric(a)?;
    let ys = dataset.numeric(b)?;
    pearson(&xs, &ys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Column;

    #[test]
    fn perfect_linear_relation_is_unit_correlation() {
        let xs: Vec<Option<f64>> = (0..10).map(|i| Some(i as f64)).collect();
        let ys: Vec<Option<f64>> = (0..10).map(|i| Some(2.0 * i as f64 + 1.0)).collect();
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_pairs_are_excluded() {
        let xs = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let ys = vec![Some(2.0), Some(9.0), Some(6.0), Some(8.0)];
        assert!(pearson(&xs, &ys).is_some());
    }

    #[test]
    fn constant_series_has_no_correlation() {
        let xs = vec![Some(1.0); 10];
        let ys: Vec<Option<f64>> = (0..10).map(|i| Some(i as f64)).collect();
        assert!(pearson(&xs, &ys).is_none());
    }

    #[test]
    fn column_correlation_reads_the_dataset() {
        let ds = Dataset::from_columns(vec![
            Column::numeric("x", [1.0, 2.0, 3.0, 4.0]),
            Column::numeric("y", [2.0, 4.0, 6.0, 8.0]),
        ])
        .unwrap();
        let r = column_correlation(&ds, "x", "y").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert!(column_correlation(&ds, "x", "missing").is_none());
    }
}
