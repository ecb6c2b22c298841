//! Regression adjustment: the treatment coefficient after controlling for
//! observed confounders. Binary outcomes take a logistic path and report
//! the marginal effect at the means.

use chrono::Utc;
use retain_core::config::StatsConfig;
use retain_core::constants;
use retain_core::ids;
use retain_core::models::{Confidence, EffectDirection, TestMethod, TestResult};
use retain_data::Dataset;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::linalg;
use crate::logit;
use crate::ols;
use crate::prepare::{self, is_binary, std_dev};

/// Estimate the treatment effect on the outcome, adjusting for controls.
pub fn regression_adjustment(
    config: &StatsConfig,
    dataset: &Dataset,
    hypothesis_id: &str,
    treatment: &str,
    outcome: &str,
    controls: &[String],
) -> TestResult {
    let method = TestMethod::RegressionAdjustment;
    let Some(prepared) = prepare::prepare(dataset, treatment, outcome, controls) else {
        return TestResult::skipped(hypothesis_id, method, "treatment or outcome column missing");
    };
    let mut warnings = prepared.warnings.clone();

    let n = prepared.n();
    if n < constants::MIN_REGRESSION_ROWS {
        warnings.push(format!(
            "insufficient sample for regression ({n} < {})",
            constants::MIN_REGRESSION_ROWS
        ));
        let mut result = TestResult::skipped(hypothesis_id, method, "");
        result.warnings = warnings;
        return result;
    }
    if n < constants::SMALL_SAMPLE_ROWS {
        warnings.push(format!(
            "small sample ({n} < {}); estimates are imprecise",
            constants::SMALL_SAMPLE_ROWS
        ));
    }

    // Treatment first, then controls.
    let rows: Vec<Vec<f64>> = prepared
        .treatment
        .iter()
        .zip(prepared.controls.iter())
        .map(|(t, controls)| {
            let mut row = Vec::with_capacity(1 + controls.len());
            row.push(*t);
            row.extend_from_slice(controls);
            row
        })
        .collect();

    let outcome_sd = std_dev(&prepared.outcome);
    let estimate = if is_binary(&prepared.outcome) {
        fit_logistic(&rows, &prepared.outcome)
    } else {
        fit_linear(&rows, &prepared.outcome)
    };

    let estimate = match estimate {
        Ok(e) => e,
        Err(message) => {
            warnings.push(message);
            let mut result = TestResult::skipped(hypothesis_id, method, "");
            result.warnings = warnings;
            return result;
        }
    };

    if estimate.condition_number > constants::COLLINEARITY_CONDITION_LIMIT {
        warnings.push(format!(
            "controls are collinear (condition number {:.0})",
            estimate.condition_number
        ));
    }

    let effect_size = if outcome_sd > 0.0 {
        estimate.point.abs() / outcome_sd
    } else {
        0.0
    };
    let is_significant = estimate.p_value < config.significance_level;

    debug!(
        hypothesis_id,
        point = estimate.point,
        p_value = estimate.p_value,
        "regression adjustment complete"
    );

    TestResult {
        id: ids::next_id("test"),
        hypothesis_id: hypothesis_id.to_string(),
        method,
        is_significant,
        p_value: Some(estimate.p_value),
        effect_size: Some(effect_size),
        effect_direction: EffectDirection::from_estimate(estimate.point),
        point_estimate: Some(estimate.point),
        confidence_interval: Some((
            estimate.point - 1.96 * estimate.standard_error,
            estimate.point + 1.96 * estimate.standard_error,
        )),
        standard_error: Some(estimate.standard_error),
        confidence: Confidence::from_effect_size(effect_size),
        sample_size: Some(n),
        balance_score: None,
        warnings,
        created_at: Utc::now(),
    }
}

struct TreatmentEstimate {
    point: f64,
    standard_error: f64,
    p_value: f64,
    condition_number: f64,
}

fn fit_linear(rows: &[Vec<f64>], y: &[f64]) -> Result<TreatmentEstimate, String> {
    let fit = ols::fit(rows, y).map_err(|e| format!("regression failed: {e}"))?;
    Ok(TreatmentEstimate {
        point: fit.coefficients[1],
        standard_error: fit.standard_errors[1],
        p_value: fit.p_value(1),
        condition_number: fit.condition_number,
    })
}

/// Logistic path: the treatment coefficient translated to the probability
/// scale as the marginal effect at the covariate means.
fn fit_logistic(rows: &[Vec<f64>], y: &[f64]) -> Result<TreatmentEstimate, String> {
    let fit = logit::fit(rows, y).map_err(|e| format!("logistic regression failed: {e}"))?;
    if !fit.converged {
        return Err("logistic regression did not converge".to_string());
    }

    let k = rows.first().map(Vec::len).unwrap_or(0);
    let n = rows.len() as f64;
    let mean_row: Vec<f64> = (0..k)
        .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n)
        .collect();
    let p_at_means = fit.predict(&mean_row);
    let scale = p_at_means * (1.0 - p_at_means);

    let coefficient = fit.coefficients[1];
    let coefficient_se = fit.standard_errors[1];
    let marginal = coefficient * scale;
    let marginal_se = coefficient_se * scale;

    let p_value = if coefficient_se > 0.0 {
        let z = coefficient / coefficient_se;
        match Normal::new(0.0, 1.0) {
            Ok(dist) => (2.0 * (1.0 - dist.cdf(z.abs()))).clamp(0.0, 1.0),
            Err(_) => 1.0,
        }
    } else {
        1.0
    };

    Ok(TreatmentEstimate {
        point: marginal,
        standard_error: marginal_se,
        p_value,
        condition_number: design_condition_number(rows),
    })
}

/// Condition number of the unweighted design matrix, intercept included.
fn design_condition_number(rows: &[Vec<f64>]) -> f64 {
    let k = rows.first().map(Vec::len).unwrap_or(0);
    let p = k + 1;
    let mut gram = vec![vec![0.0; p]; p];
    for row in rows {
        let mut design = Vec::with_capacity(p);
        design.push(1.0);
        design.extend_from_slice(row);
        for i in 0..p {
            for j in 0..p {
                gram[i][j] += design[i] * design[j];
            }
        }
    }
    linalg::condition_number(&gram)
}
