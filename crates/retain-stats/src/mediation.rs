//! Mediation decomposition by the product-of-coefficients method.
//!
//! Two regressions: mediator on treatment (a-path) and outcome on
//! treatment + mediator (b-path, with the treatment coefficient as the
//! direct effect). Indirect effect = a·b with a Sobel standard error.

use retain_core::config::StatsConfig;
use retain_data::Dataset;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::ols;
use crate::prepare;

/// Decomposed effects for one (treatment, mediator, outcome) triple.
#[derive(Debug, Clone)]
pub struct MediationOutcome {
    pub mediator: String,
    /// Treatment → outcome holding the mediator fixed.
    pub direct_effect: f64,
    /// Effect routed through the mediator (a·b).
    pub indirect_effect: f64,
    pub total_effect: f64,
    pub indirect_se: f64,
    /// 95% interval for the indirect effect.
    pub indirect_ci: (f64, f64),
    pub indirect_p_value: f64,
    /// Direct and indirect effects agree in sign (or one is zero).
    pub sign_consistent: bool,
    pub sample_size: usize,
    pub warnings: Vec<String>,
}

impl MediationOutcome {
    pub fn is_significant(&self, significance_level: f64) -> bool {
        self.indirect_p_value < significance_level
    }
}

/// Decompose the treatment effect through one mediator.
/// None when the columns cannot be assembled or the fits fail.
pub fn mediation_decomposition(
    _config: &StatsConfig,
    dataset: &Dataset,
    treatment: &str,
    mediator: &str,
    outcome: &str,
    confounders: &[String],
) -> Option<MediationOutcome> {
    // a-path: mediator ~ treatment + confounders.
    let a_prepared = prepare::prepare(dataset, treatment, mediator, confounders)?;
    let mut warnings = a_prepared.warnings.clone();
    let a_rows: Vec<Vec<f64>> = design_rows(&a_prepared.treatment, &a_prepared.controls);
    let a_fit = ols::fit(&a_rows, &a_prepared.outcome).ok()?;
    let a = a_fit.coefficients[1];
    let a_se = a_fit.standard_errors[1];

    // b-path: outcome ~ treatment + mediator + confounders.
    let mut b_controls = vec![mediator.to_string()];
    b_controls.extend_from_slice(confounders);
    let b_prepared = prepare::prepare(dataset, treatment, outcome, &b_controls)?;
    warnings.extend(b_prepared.warnings.iter().cloned());
    let b_rows: Vec<Vec<f64>> = design_rows(&b_prepared.treatment, &b_prepared.controls);
    let b_fit = ols::fit(&b_rows, &b_prepared.outcome).ok()?;
    let direct = b_fit.coefficients[1];
    // Mediator is the first control in the b-path design.
    let b = b_fit.coefficients[2];
    let b_se = b_fit.standard_errors[2];

    let indirect = a * b;
    let sobel_se = (a * a * b_se * b_se + b * b * a_se * a_se).sqrt();
    let indirect_ci = (indirect - 1.96 * sobel_se, indirect + 1.96 * sobel_se);
    let indirect_p_value = if sobel_se > 0.0 {
        let z = indirect / sobel_se;
        match Normal::new(0.0, 1.0) {
            Ok(dist) => (2.0 * (1.0 - dist.cdf(z.abs()))).clamp(0.0, 1.0),
            Err(_) => 1.0,
        }
    } else {
        1.0
    };

    let sign_consistent = direct == 0.0 || indirect == 0.0 || direct.signum() == indirect.signum();

    debug!(
        treatment,
        mediator, direct, indirect, "mediation decomposition complete"
    );

    Some(MediationOutcome {
        mediator: mediator.to_string(),
        direct_effect: direct,
        indirect_effect: indirect,
        total_effect: direct + indirect,
        indirect_se: sobel_se,
        indirect_ci,
        indirect_p_value,
        sign_consistent,
        sample_size: b_prepared.n(),
        warnings,
    })
}

fn design_rows(treatment: &[f64], controls: &[Vec<f64>]) -> Vec<Vec<f64>> {
    treatment
        .iter()
        .zip(controls.iter())
        .map(|(t, c)| {
            let mut row = Vec::with_capacity(1 + c.len());
            row.push(*t);
            row.extend_from_slice(c);
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use retain_core::config::StatsConfig;
    use retain_data::{Column, Dataset};

    /// t → m → y with a strong mediated path and no direct path.
    fn mediated_dataset() -> Dataset {
        let n = 200;
        let t: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        let m: Vec<f64> = t
            .iter()
            .enumerate()
            .map(|(i, t)| 2.0 * t + ((i % 7) as f64) * 0.1)
            .collect();
        let y: Vec<f64> = m
            .iter()
            .enumerate()
            .map(|(i, m)| 1.5 * m + ((i % 5) as f64) * 0.1)
            .collect();
        Dataset::from_columns(vec![
            Column::numeric("t", t),
            Column::numeric("m", m),
            Column::numeric("y", y),
        ])
        .unwrap()
    }

    #[test]
    fn mediated_path_dominates() {
        let outcome =
            mediation_decomposition(&StatsConfig::default(), &mediated_dataset(), "t", "m", "y", &[])
                .unwrap();
        // Indirect ≈ 2.0 × 1.5 = 3.0, direct ≈ 0.
        assert!(outcome.indirect_effect > 2.0, "indirect = {}", outcome.indirect_effect);
        assert!(outcome.direct_effect.abs() < 0.5, "direct = {}", outcome.direct_effect);
        assert!(outcome.indirect_effect.abs() > outcome.direct_effect.abs());
        assert!(
            (outcome.total_effect - outcome.direct_effect - outcome.indirect_effect).abs() < 1e-9
        );
    }
}
