//! Stage 3: causal testing. Runs each hypothesis's declared methods where
//! feasible, appends one TestResult per method (skips included), writes
//! mediation effects into the causal structure, and rules on validation.
//!
//! Hypotheses are tested in parallel: each owns disjoint result storage,
//! declared order is preserved, and a single writer updates the session.

use chrono::Utc;
use rayon::prelude::*;
use retain_core::errors::{ReasoningError, RetainResult};
use retain_core::models::{
    EffectDirection, Hypothesis, ReasoningSession, TestMethod, TestResult,
};
use retain_data::{Cell, Column, DataProfile, Dataset, SemanticType};
use retain_stats::{aggregate, MediationOutcome, StatKernel};
use tracing::{debug, info};

use crate::util::humanize;

/// Runs the statistical battery for every hypothesis in a session.
pub struct CausalTester {
    kernel: StatKernel,
}

impl CausalTester {
    pub fn new(kernel: StatKernel) -> Self {
        Self { kernel }
    }

    /// Test all hypotheses and update the session's derived scores.
    pub fn test_all(
        &self,
        session: &mut ReasoningSession,
        dataset: &Dataset,
        profile: &DataProfile,
    ) -> RetainResult<()> {
        let mut hypotheses = std::mem::take(&mut session.hypotheses);

        let outcomes: Vec<RetainResult<()>> = hypotheses
            .par_iter_mut()
            .map(|hypothesis| self.test_one(hypothesis, dataset, profile))
            .collect();

        // Single writer: results go back onto the session in declared order.
        session.hypotheses = hypotheses;
        for outcome in outcomes {
            outcome?;
        }

        session.recount();
        session.confidence_score = mean_structure_confidence(session);
        session.completeness_score = completeness(session);

        info!(
            session_id = %session.id,
            validated = session.validated_hypotheses_count,
            confidence = session.confidence_score,
            "causal testing complete"
        );
        Ok(())
    }

    fn test_one(
        &self,
        hypothesis: &mut Hypothesis,
        dataset: &Dataset,
        profile: &DataProfile,
    ) -> RetainResult<()> {
        if hypothesis.validated.is_some() {
            return Err(ReasoningError::InvariantViolation {
                detail: format!("hypothesis {} was already ruled on", hypothesis.id),
            }
            .into());
        }

        for method in hypothesis.test_methods.clone() {
            let result = self.run_method(method, hypothesis, dataset, profile);
            hypothesis.test_results.push(result);
        }

        self.run_mediation(hypothesis, dataset);

        let verdict = aggregate(&hypothesis.test_results, hypothesis.expected_direction());
        hypothesis.validated = Some(verdict.validated);
        hypothesis.tested_at = Some(Utc::now());

        debug!(
            hypothesis_id = %hypothesis.id,
            cause = %hypothesis.cause,
            validated = verdict.validated,
            pooled_effect = verdict.pooled_effect_size,
            "hypothesis tested"
        );
        Ok(())
    }

    fn run_method(
        &self,
        method: TestMethod,
        hypothesis: &Hypothesis,
        dataset: &Dataset,
        profile: &DataProfile,
    ) -> TestResult {
        match method {
            TestMethod::GrangerCausality => {
                if !dataset.has_time_index() {
                    return TestResult::skipped(
                        &hypothesis.id,
                        method,
                        "cross-sectional data has no time index; granger test skipped",
                    );
                }
                let xs = dataset.numeric(&hypothesis.cause).unwrap_or_default();
                let ys = dataset.numeric(&hypothesis.effect).unwrap_or_default();
                self.kernel.granger_lag_test(&xs, &ys, &hypothesis.id)
            }
            TestMethod::PropensityMatching => {
                self.run_propensity(hypothesis, dataset, profile)
            }
            TestMethod::RegressionAdjustment => self.kernel.regression_adjustment(
                dataset,
                &hypothesis.id,
                &hypothesis.cause,
                &hypothesis.effect,
                &hypothesis.confounders,
            ),
            other => TestResult::skipped(
                &hypothesis.id,
                other,
                format!(
                    "no identification strategy for {}; method skipped",
                    other.as_str()
                ),
            ),
        }
    }

    /// Propensity matching with on-the-fly binarization of a continuous
    /// treatment at its median.
    fn run_propensity(
        &self,
        hypothesis: &Hypothesis,
        dataset: &Dataset,
        profile: &DataProfile,
    ) -> TestResult {
        let treatment_type = profile
            .column(&hypothesis.cause)
            .map(|c| c.semantic_type)
            .unwrap_or(SemanticType::Categorical);

        match treatment_type {
            SemanticType::Binary => self.kernel.propensity_matching(
                dataset,
                &hypothesis.id,
                &hypothesis.cause,
                &hypothesis.effect,
                &hypothesis.confounders,
            ),
            SemanticType::Continuous | SemanticType::Ordinal => {
                let Some((augmented, derived, threshold)) =
                    binarize_at_median(dataset, &hypothesis.cause)
                else {
                    return TestResult::skipped(
                        &hypothesis.id,
                        TestMethod::PropensityMatching,
                        "treatment could not be binarized; matching skipped",
                    );
                };
                let mut result = self.kernel.propensity_matching(
                    &augmented,
                    &hypothesis.id,
                    &derived,
                    &hypothesis.effect,
                    &hypothesis.confounders,
                );
                result.warnings.push(format!(
                    "treatment '{}' binarized at its median ({threshold:.3})",
                    hypothesis.cause
                ));
                result
            }
            SemanticType::Categorical => TestResult::skipped(
                &hypothesis.id,
                TestMethod::PropensityMatching,
                "treatment is categorical with no stated threshold; matching skipped",
            ),
        }
    }

    /// Run mediation per declared mediator and fold the strongest
    /// decomposition into the causal structure.
    fn run_mediation(&self, hypothesis: &mut Hypothesis, dataset: &Dataset) {
        let mediators: Vec<String> = hypothesis
            .mediators
            .iter()
            .filter(|m| dataset.has_column(m))
            .cloned()
            .collect();

        let mut best: Option<MediationOutcome> = None;
        for mediator in &mediators {
            let Some(outcome) = self.kernel.mediation_decomposition(
                dataset,
                &hypothesis.cause,
                mediator,
                &hypothesis.effect,
                &hypothesis.confounders,
            ) else {
                continue;
            };
            let replace = best
                .as_ref()
                .map(|b| outcome.indirect_effect.abs() > b.indirect_effect.abs())
                .unwrap_or(true);
            if replace {
                best = Some(outcome);
            }
        }

        let Some(structure) = hypothesis.causal_structure.as_mut() else {
            return;
        };
        match best {
            Some(mediation) => {
                structure.direct_effect = mediation.direct_effect;
                structure.indirect_effect = mediation.indirect_effect;
                structure.total_effect = mediation.total_effect;
                // The deepest driver is the mediator when the routed effect
                // dominates the residual direct path.
                if mediation.indirect_effect.abs() > mediation.direct_effect.abs() {
                    structure.true_cause = mediation.mediator.clone();
                    structure.actionable_lever = humanize(&mediation.mediator);
                }
            }
            None => {
                // No mediated path: the dominant executed test supplies the
                // effect estimate.
                if let Some(dominant) = dominant_result(&hypothesis.test_results) {
                    let estimate = dominant.point_estimate.unwrap_or_else(|| {
                        let magnitude = dominant.effect_size.unwrap_or(0.0);
                        match dominant.effect_direction {
                            EffectDirection::Negative => -magnitude,
                            _ => magnitude,
                        }
                    });
                    structure.direct_effect = estimate;
                    structure.indirect_effect = 0.0;
                    structure.total_effect = estimate;
                }
            }
        }
    }
}

/// The executed result with the smallest p-value.
fn dominant_result(results: &[TestResult]) -> Option<&TestResult> {
    results
        .iter()
        .filter(|r| r.was_executed())
        .min_by(|a, b| {
            let pa = a.p_value.unwrap_or(1.0);
            let pb = b.p_value.unwrap_or(1.0);
            pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Clone the dataset with a derived 0/1 column thresholded at the median.
fn binarize_at_median(dataset: &Dataset, column: &str) -> Option<(Dataset, String, f64)> {
    let source = dataset.column(column)?;
    let mut present = source.present_numeric();
    if present.len() < 2 {
        return None;
    }
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = present[present.len() / 2];

    let derived_name = format!("{column}__above_median");
    let derived = Column {
        name: derived_name.clone(),
        values: source
            .values
            .iter()
            .map(|cell| match cell.as_number() {
                Some(v) => Cell::Number(if v > median { 1.0 } else { 0.0 }),
                None => Cell::Null,
            })
            .collect(),
    };

    let mut columns = dataset.columns().to_vec();
    columns.push(derived);
    let mut augmented = Dataset::from_columns(columns).ok()?;
    if let Some(time) = dataset.time_column() {
        augmented = augmented.with_time_column(time);
    }
    Some((augmented, derived_name, median))
}

fn mean_structure_confidence(session: &ReasoningSession) -> f64 {
    let confidences: Vec<f64> = session
        .hypotheses
        .iter()
        .filter(|h| h.validated == Some(true))
        .filter_map(|h| h.causal_structure.as_ref())
        .map(|s| s.structure_confidence)
        .collect();
    if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    }
}

/// Executed (non-skipped) tests over declared tests, across all hypotheses.
fn completeness(session: &ReasoningSession) -> f64 {
    let declared: usize = session.hypotheses.iter().map(|h| h.test_methods.len()).sum();
    if declared == 0 {
        return 0.0;
    }
    let executed: usize = session
        .hypotheses
        .iter()
        .flat_map(|h| h.test_results.iter())
        .filter(|r| r.was_executed())
        .count();
    (executed as f64 / declared as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binarize_splits_at_the_median() {
        let dataset = Dataset::from_columns(vec![Column::numeric(
            "spend",
            [1.0, 2.0, 3.0, 4.0, 5.0],
        )])
        .unwrap();
        let (augmented, name, median) = binarize_at_median(&dataset, "spend").unwrap();
        assert_eq!(median, 3.0);
        let derived = augmented.column(&name).unwrap().present_numeric();
        assert_eq!(derived, vec![0.0, 0.0, 0.0, 1.0, 1.0]);
    }
}
