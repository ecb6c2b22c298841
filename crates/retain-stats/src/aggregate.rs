//! Verdict aggregation across test results for one hypothesis.
//!
//! A hypothesis validates iff at least one executed test is significant in
//! the expected direction and no executed test is significant in the
//! opposite direction. Pooled effect size is the inverse-variance-weighted
//! mean over executed tests.

use retain_core::models::{Confidence, EffectDirection, TestResult};

/// Aggregated judgement over a hypothesis's test results.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub validated: bool,
    pub pooled_effect_size: f64,
    pub confidence: Confidence,
    pub direction: EffectDirection,
    pub n_executed: usize,
    pub n_significant: usize,
}

/// Pure function of the test results and the expected direction.
pub fn aggregate(results: &[TestResult], expected: EffectDirection) -> Verdict {
    let executed: Vec<&TestResult> = results.iter().filter(|r| r.was_executed()).collect();

    let supporting = executed
        .iter()
        .filter(|r| r.is_significant && r.effect_direction == expected)
        .count();
    let opposing = executed
        .iter()
        .filter(|r| r.is_significant && r.effect_direction == expected.opposite())
        .count();
    let n_significant = executed.iter().filter(|r| r.is_significant).count();

    let validated = supporting >= 1 && opposing == 0;

    // Inverse-variance weights where a standard error exists; unit otherwise.
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for result in &executed {
        let Some(effect) = result.effect_size else {
            continue;
        };
        let weight = match result.standard_error {
            Some(se) if se > 0.0 => 1.0 / (se * se),
            _ => 1.0,
        };
        weighted_sum += weight * effect;
        weight_total += weight;
    }
    let pooled_effect_size = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };

    let direction = if validated {
        expected
    } else {
        modal_direction(&executed)
    };

    Verdict {
        validated,
        pooled_effect_size,
        confidence: Confidence::from_effect_size(pooled_effect_size),
        direction,
        n_executed: executed.len(),
        n_significant,
    }
}

fn modal_direction(executed: &[&TestResult]) -> EffectDirection {
    let positive = executed
        .iter()
        .filter(|r| r.effect_direction == EffectDirection::Positive)
        .count();
    let negative = executed
        .iter()
        .filter(|r| r.effect_direction == EffectDirection::Negative)
        .count();
    if positive > negative {
        EffectDirection::Positive
    } else if negative > positive {
        EffectDirection::Negative
    } else {
        EffectDirection::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use retain_core::ids;
    use retain_core::models::TestMethod;

    fn result(
        significant: bool,
        direction: EffectDirection,
        effect: f64,
        se: Option<f64>,
    ) -> TestResult {
        TestResult {
            id: ids::next_id("test"),
            hypothesis_id: "hyp".into(),
            method: TestMethod::RegressionAdjustment,
            is_significant: significant,
            p_value: Some(if significant { 0.01 } else { 0.5 }),
            effect_size: Some(effect),
            effect_direction: direction,
            point_estimate: Some(effect),
            confidence_interval: None,
            standard_error: se,
            confidence: Confidence::from_effect_size(effect),
            sample_size: Some(100),
            balance_score: None,
            warnings: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn one_supporting_test_validates() {
        let results = vec![result(true, EffectDirection::Positive, 0.4, Some(0.1))];
        let verdict = aggregate(&results, EffectDirection::Positive);
        assert!(verdict.validated);
        assert_eq!(verdict.direction, EffectDirection::Positive);
    }

    #[test]
    fn opposite_significant_test_vetoes() {
        let results = vec![
            result(true, EffectDirection::Positive, 0.4, Some(0.1)),
            result(true, EffectDirection::Negative, 0.3, Some(0.1)),
        ];
        let verdict = aggregate(&results, EffectDirection::Positive);
        assert!(!verdict.validated);
    }

    #[test]
    fn skipped_results_do_not_count() {
        let results = vec![TestResult::skipped("hyp", TestMethod::GrangerCausality, "no index")];
        let verdict = aggregate(&results, EffectDirection::Positive);
        assert!(!verdict.validated);
        assert_eq!(verdict.n_executed, 0);
        assert_eq!(verdict.pooled_effect_size, 0.0);
    }

    #[test]
    fn pooling_weights_by_inverse_variance() {
        // Precise test says 0.6, noisy test says 0.1: pooled leans to 0.6.
        let results = vec![
            result(true, EffectDirection::Positive, 0.6, Some(0.05)),
            result(false, EffectDirection::Positive, 0.1, Some(0.5)),
        ];
        let verdict = aggregate(&results, EffectDirection::Positive);
        assert!(verdict.pooled_effect_size > 0.5);
        assert_eq!(verdict.confidence, Confidence::High);
    }
}
