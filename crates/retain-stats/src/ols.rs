//! Ordinary least squares with analytic standard errors.
//!
//! P-values use Student's t via `statrs`.

use retain_core::errors::StatsError;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::linalg;

/// A fitted linear model. `coefficients[0]` is the intercept; predictor
/// coefficients follow in input order.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub standard_errors: Vec<f64>,
    pub residual_variance: f64,
    pub r_squared: f64,
    /// Condition number of the design matrix (intercept included).
    pub condition_number: f64,
    pub n: usize,
    /// Predictor count, excluding the intercept.
    pub k: usize,
}

impl OlsFit {
    /// Degrees of freedom of the residual.
    pub fn df(&self) -> f64 {
        (self.n as f64) - (self.k as f64) - 1.0
    }

    /// Two-sided p-value for the coefficient at `index` (0 = intercept).
    pub fn p_value(&self, index: usize) -> f64 {
        let se = self.standard_errors[index];
        if se <= 0.0 || !se.is_finite() {
            return 1.0;
        }
        let t = self.coefficients[index] / se;
        t_p_value(t, self.df())
    }
}

/// Fit `y ~ 1 + rows`. Each element of `rows` is one observation's
/// predictor vector; the intercept is added internally.
pub fn fit(rows: &[Vec<f64>], y: &[f64]) -> Result<OlsFit, StatsError> {
    let n = rows.len();
    if n != y.len() {
        return Err(StatsError::DimensionMismatch {
            expected: n,
            actual: y.len(),
        });
    }
    let k = rows.first().map(Vec::len).unwrap_or(0);
    let p = k + 1;
    if n <= p {
        return Err(StatsError::SingularMatrix {
            detail: format!("{n} observations cannot identify {p} coefficients"),
        });
    }

    // Gram matrix X'X and moment vector X'y, intercept first.
    let mut gram = vec![vec![0.0; p]; p];
    let mut moment = vec![0.0; p];
    for (row, &yi) in rows.iter().zip(y.iter()) {
        let mut design = Vec::with_capacity(p);
        design.push(1.0);
        design.extend_from_slice(row);
        for i in 0..p {
            moment[i] += design[i] * yi;
            for j in 0..p {
                gram[i][j] += design[i] * design[j];
            }
        }
    }

    let coefficients = linalg::solve(&gram, &moment)?;
    let inverse_gram = linalg::invert(&gram)?;

    let mut ssr = 0.0;
    let mean_y = y.iter().sum::<f64>() / n as f64;
    let mut sst = 0.0;
    for (row, &yi) in rows.iter().zip(y.iter()) {
        let mut predicted = coefficients[0];
        for (j, value) in row.iter().enumerate() {
            predicted += coefficients[j + 1] * value;
        }
        ssr += (yi - predicted).powi(2);
        sst += (yi - mean_y).powi(2);
    }

    let df = (n - p) as f64;
    let residual_variance = ssr / df;
    let standard_errors = (0..p)
        .map(|j| (residual_variance * inverse_gram[j][j]).max(0.0).sqrt())
        .collect();
    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { 0.0 };

    Ok(OlsFit {
        coefficients,
        standard_errors,
        residual_variance,
        r_squared,
        condition_number: linalg::condition_number(&gram),
        n,
        k,
    })
}

/// Two-sided p-value of a t statistic with `df` degrees of freedom.
pub fn t_p_value(t_stat: f64, df: f64) -> f64 {
    if df <= 0.0 || !t_stat.is_finite() {
        return 1.0;
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t_stat.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
