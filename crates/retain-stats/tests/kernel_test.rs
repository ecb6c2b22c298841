//! Integration tests for the statistical kernel against synthetic datasets
//! with known causal structure.

use retain_core::config::StatsConfig;
use retain_core::models::EffectDirection;
use retain_fixtures::{confounded_dataset, lagged_series_dataset, mediated_churn_dataset};
use retain_stats::StatKernel;

fn kernel() -> StatKernel {
    StatKernel::new(StatsConfig::default())
}

#[test]
fn propensity_matching_detects_the_honest_signal() {
    let dataset = mediated_churn_dataset(600, 41);
    let result = kernel().propensity_matching(
        &dataset,
        "hyp_1",
        "late_delivery",
        "churn_30d",
        &["tenure_days".to_string()],
    );
    assert!(result.is_significant, "warnings: {:?}", result.warnings);
    assert_eq!(result.effect_direction, EffectDirection::Positive);
    assert!(result.point_estimate.unwrap() > 0.1);
    assert!(result.balance_score.is_some());
    assert!(result.sample_size.unwrap() >= 30);
}

#[test]
fn propensity_matching_warns_on_small_samples() {
    let dataset = mediated_churn_dataset(40, 42);
    let result = kernel().propensity_matching(
        &dataset,
        "hyp_1",
        "late_delivery",
        "churn_30d",
        &["tenure_days".to_string()],
    );
    assert!(!result.is_significant);
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("fewer than 30 matched pairs")),
        "warnings: {:?}",
        result.warnings
    );
}

#[test]
fn regression_adjustment_zeroes_out_a_pure_confound() {
    let dataset = confounded_dataset(7);
    let result = kernel().regression_adjustment(
        &dataset,
        "hyp_a",
        "feature_a",
        "churn_30d",
        &["driver_c".to_string()],
    );
    // Exact conditional independence by construction.
    assert!(!result.is_significant, "p = {:?}", result.p_value);
    assert!(result.point_estimate.unwrap().abs() < 0.05);
}

#[test]
fn regression_adjustment_finds_the_unadjusted_confound() {
    // Without controlling driver_c the spurious association is strong.
    let dataset = confounded_dataset(7);
    let result = kernel().regression_adjustment(&dataset, "hyp_a", "feature_a", "churn_30d", &[]);
    assert!(result.is_significant);
    assert_eq!(result.effect_direction, EffectDirection::Positive);
}

#[test]
fn regression_adjustment_skips_below_the_row_floor() {
    let dataset = mediated_churn_dataset(20, 5);
    let result =
        kernel().regression_adjustment(&dataset, "hyp_1", "late_delivery", "churn_30d", &[]);
    assert!(!result.was_executed());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("insufficient sample")));
}

#[test]
fn granger_detects_a_lagged_driver() {
    let dataset = lagged_series_dataset(200, 13);
    let xs = dataset.numeric("support_backlog").unwrap();
    let ys = dataset.numeric("churn_rate").unwrap();
    let result = kernel().granger_lag_test(&xs, &ys, "hyp_g");
    assert!(result.is_significant, "warnings: {:?}", result.warnings);
}

#[test]
fn granger_in_reverse_is_weaker_than_forward() {
    let dataset = lagged_series_dataset(200, 13);
    let xs = dataset.numeric("support_backlog").unwrap();
    let ys = dataset.numeric("churn_rate").unwrap();
    let forward = kernel().granger_lag_test(&xs, &ys, "hyp_g");
    let reverse = kernel().granger_lag_test(&ys, &xs, "hyp_g");
    assert!(forward.p_value.unwrap() <= reverse.p_value.unwrap());
}

#[test]
fn mediation_recovers_the_routed_effect() {
    let dataset = mediated_churn_dataset(600, 41);
    let outcome = kernel()
        .mediation_decomposition(
            &dataset,
            "late_delivery",
            "low_onboarding_engagement",
            "churn_30d",
            &["tenure_days".to_string()],
        )
        .unwrap();
    assert!(
        outcome.indirect_effect.abs() > outcome.direct_effect.abs(),
        "indirect {} direct {}",
        outcome.indirect_effect,
        outcome.direct_effect
    );
    assert!(
        (outcome.total_effect - outcome.direct_effect - outcome.indirect_effect).abs() < 1e-9
    );
    assert!(outcome.indirect_effect > 0.1);
}
