//! Granger-style lag test: do lagged values of x improve prediction of y
//! beyond lagged y alone?
//!
//! F-test per lag order via `statrs`; the minimum p-value across orders
//! decides significance, as in the usual multi-lag scan.

use chrono::Utc;
use retain_core::config::StatsConfig;
use retain_core::ids;
use retain_core::models::{Confidence, EffectDirection, TestMethod, TestResult};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use tracing::debug;

use crate::ols;

/// Test whether x Granger-causes y over lag orders `1..=max_lag`.
///
/// Inputs must already be in temporal order; rows with a missing value on
/// either side are dropped pairwise.
pub fn granger_lag_test(
    config: &StatsConfig,
    xs: &[Option<f64>],
    ys: &[Option<f64>],
    hypothesis_id: &str,
) -> TestResult {
    let method = TestMethod::GrangerCausality;
    let max_lag = config.granger_max_lag.max(1);

    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    let n = pairs.len();
    if n < max_lag * 2 + 3 {
        return TestResult::skipped(
            hypothesis_id,
            method,
            format!("insufficient series length: {n} < {}", max_lag * 2 + 3),
        );
    }

    let x: Vec<f64> = pairs.iter().map(|(x, _)| *x).collect();
    let y: Vec<f64> = pairs.iter().map(|(_, y)| *y).collect();

    let mut best: Option<(f64, usize)> = None;
    for lag in 1..=max_lag {
        let Some(p) = f_test_at_lag(&x, &y, lag) else {
            continue;
        };
        match best {
            Some((best_p, _)) if best_p <= p => {}
            _ => best = Some((p, lag)),
        }
    }

    let Some((min_p, best_lag)) = best else {
        return TestResult::skipped(hypothesis_id, method, "lag regressions could not be fitted");
    };

    // Direction and magnitude from the lagged cross-correlation.
    let lagged_corr = lagged_correlation(&x, &y, best_lag).unwrap_or(0.0);
    let effect_size = lagged_corr.abs();
    let is_significant = min_p < config.significance_level;

    debug!(
        hypothesis_id,
        best_lag, min_p, "granger lag test complete"
    );

    TestResult {
        id: ids::next_id("test"),
        hypothesis_id: hypothesis_id.to_string(),
        method,
        is_significant,
        p_value: Some(min_p),
        effect_size: Some(effect_size),
        effect_direction: EffectDirection::from_estimate(lagged_corr),
        point_estimate: None,
        confidence_interval: None,
        standard_error: None,
        confidence: Confidence::from_effect_size(effect_size),
        sample_size: Some(n),
        balance_score: None,
        warnings: Vec::new(),
        created_at: Utc::now(),
    }
}

/// Restricted-vs-unrestricted F-test at one lag order.
fn f_test_at_lag(x: &[f64], y: &[f64], lag: usize) -> Option<f64> {
    let n = y.len();
    let observations = n - lag;
    // Unrestricted model has 2·lag predictors plus the intercept.
    if observations <= 2 * lag + 1 {
        return None;
    }

    let mut restricted_rows = Vec::with_capacity(observations);
    let mut unrestricted_rows = Vec::with_capacity(observations);
    let mut targets = Vec::with_capacity(observations);
    for t in lag..n {
        let y_lags: Vec<f64> = (1..=lag).map(|l| y[t - l]).collect();
        let x_lags: Vec<f64> = (1..=lag).map(|l| x[t - l]).collect();
        restricted_rows.push(y_lags.clone());
        let mut full = y_lags;
        full.extend(x_lags);
        unrestricted_rows.push(full);
        targets.push(y[t]);
    }

    let restricted = ols::fit(&restricted_rows, &targets).ok()?;
    let unrestricted = ols::fit(&unrestricted_rows, &targets).ok()?;

    let ssr_restricted = restricted.residual_variance * restricted.df();
    let ssr_unrestricted = unrestricted.residual_variance * unrestricted.df();
    let df2 = unrestricted.df();
    if df2 <= 0.0 || ssr_unrestricted <= 0.0 {
        return None;
    }

    let f = ((ssr_restricted - ssr_unrestricted) / lag as f64) / (ssr_unrestricted / df2);
    if !f.is_finite() || f < 0.0 {
        return None;
    }
    let dist = FisherSnedecor::new(lag as f64, df2).ok()?;
    Some((1.0 - dist.cdf(f)).clamp(0.0, 1.0))
}

/// Correlation between x shifted back by `lag` and y.
fn lagged_correlation(x: &[f64], y: &[f64], lag: usize) -> Option<f64> {
    let n = y.len();
    if n <= lag + 2 {
        return None;
    }
    let shifted: Vec<Option<f64>> = (lag..n).map(|t| Some(x[t - lag])).collect();
    let target: Vec<Option<f64>> = (lag..n).map(|t| Some(y[t])).collect();
    retain_data::corr::pearson(&shifted, &target)
}
