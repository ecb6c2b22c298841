//! Logistic regression via iteratively reweighted least squares.
//!
//! Used for propensity-score models and binary-outcome adjustment.
//! A tiny ridge term keeps the weighted Gram matrix invertible under
//! quasi-separation.

use retain_core::errors::StatsError;

use crate::linalg;

const MAX_ITERATIONS: usize = 50;
const CONVERGENCE_TOLERANCE: f64 = 1e-8;
const RIDGE: f64 = 1e-8;
const MIN_WEIGHT: f64 = 1e-6;

/// A fitted logistic model. `coefficients[0]` is the intercept.
#[derive(Debug, Clone)]
pub struct LogitFit {
    pub coefficients: Vec<f64>,
    pub standard_errors: Vec<f64>,
    pub converged: bool,
    pub n: usize,
}

impl LogitFit {
    /// Predicted probability for one predictor vector.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut linear = self.coefficients[0];
        for (j, value) in row.iter().enumerate() {
            linear += self.coefficients[j + 1] * value;
        }
        sigmoid(linear)
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Fit `P(y=1) = sigmoid(b0 + b·row)` with y ∈ {0, 1}.
pub fn fit(rows: &[Vec<f64>], y: &[f64]) -> Result<LogitFit, StatsError> {
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

    let mut beta = vec![0.0; p];
    let mut converged = false;

    for _ in 0..MAX_ITERATIONS {
        // Weighted Gram X'WX (+ ridge) and score X'(y - p).
        let mut gram = vec![vec![0.0; p]; p];
        let mut score = vec![0.0; p];
        for (row, &yi) in rows.iter().zip(y.iter()) {
            let mut design = Vec::with_capacity(p);
            design.push(1.0);
            design.extend_from_slice(row);
            let mut linear = 0.0;
            for (j, value) in design.iter().enumerate() {
                linear += beta[j] * value;
            }
            let prob = sigmoid(linear);
            let weight = (prob * (1.0 - prob)).max(MIN_WEIGHT);
            let residual = yi - prob;
            for i in 0..p {
                score[i] += design[i] * residual;
                for j in 0..p {
                    gram[i][j] += weight * design[i] * design[j];
                }
            }
        }
        for (i, row) in gram.iter_mut().enumerate() {
            row[i] += RIDGE;
        }

        let step = linalg::solve(&gram, &score)?;
        let mut max_step = 0.0_f64;
        for (b, s) in beta.iter_mut().zip(step.iter()) {
            *b += s;
            max_step = max_step.max(s.abs());
        }
        if max_step < CONVERGENCE_TOLERANCE {
            converged = true;
            break;
        }
    }

    // Standard errors from the inverse information matrix at the optimum.
    let mut gram = vec![vec![0.0; p]; p];
    for row in rows {
        let mut design = Vec::with_capacity(p);
        design.push(1.0);
        design.extend_from_slice(row);
        let mut linear = 0.0;
        for (j, value) in design.iter().enumerate() {
            linear += beta[j] * value;
        }
        let prob = sigmoid(linear);
        let weight = (prob * (1.0 - prob)).max(MIN_WEIGHT);
        for i in 0..p {
            for j in 0..p {
                gram[i][j] += weight * design[i] * design[j];
            }
        }
    }
    for (i, row) in gram.iter_mut().enumerate() {
        row[i] += RIDGE;
    }
    let inverse = linalg::invert(&gram)?;
    let standard_errors = (0..p).map(|j| inverse[j][j].max(0.0).sqrt()).collect();

    Ok(LogitFit {
        coefficients: beta,
        standard_errors,
        converged,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separable_data_predicts_class_probabilities() {
        // y = 1 exactly when x > 5: probabilities should track the boundary.
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![(i % 11) as f64]).collect();
        let y: Vec<f64> = rows
            .iter()
            .map(|r| if r[0] > 5.0 { 1.0 } else { 0.0 })
            .collect();
        let fit = fit(&rows, &y).unwrap();
        assert!(fit.predict(&[10.0]) > 0.9);
        assert!(fit.predict(&[0.0]) < 0.1);
    }

    #[test]
    fn balanced_coin_predicts_half() {
        let rows: Vec<Vec<f64>> = (0..40).map(|_| vec![1.0]).collect();
        let y: Vec<f64> = (0..40).map(|i| (i % 2) as f64).collect();
        let fit = fit(&rows, &y).unwrap();
        let p = fit.predict(&[1.0]);
        assert!((p - 0.5).abs() < 0.05, "expected ~0.5, got {p}");
    }

    #[test]
    fn sigmoid_is_bounded() {
        assert!(sigmoid(100.0) <= 1.0);
        assert!(sigmoid(-100.0) >= 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }
}
