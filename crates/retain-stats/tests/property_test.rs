//! Property tests: verdict determinism under fuzzed inputs and mediation
//! null coverage across seeds.

use chrono::Utc;
use proptest::prelude::*;
use retain_core::config::StatsConfig;
use retain_core::ids;
use retain_core::models::{Confidence, EffectDirection, TestMethod, TestResult};
use retain_data::{Column, Dataset};
use retain_fixtures::SplitMix64;
use retain_stats::{aggregate, StatKernel};

fn direction_strategy() -> impl Strategy<Value = EffectDirection> {
    prop_oneof![
        Just(EffectDirection::Positive),
        Just(EffectDirection::Negative),
        Just(EffectDirection::None),
    ]
}

fn result_strategy() -> impl Strategy<Value = TestResult> {
    (
        any::<bool>(),
        direction_strategy(),
        0.0_f64..1.5,
        prop::option::of(0.01_f64..1.0),
        any::<bool>(),
    )
        .prop_map(|(significant, direction, effect, se, executed)| TestResult {
            id: ids::next_id("test"),
            hypothesis_id: "hyp".into(),
            method: TestMethod::RegressionAdjustment,
            is_significant: significant && executed,
            p_value: executed.then_some(if significant { 0.01 } else { 0.5 }),
            effect_size: executed.then_some(effect),
            effect_direction: direction,
            point_estimate: None,
            confidence_interval: None,
            standard_error: se,
            confidence: Confidence::Low,
            sample_size: Some(100),
            balance_score: None,
            warnings: Vec::new(),
            created_at: Utc::now(),
        })
}

proptest! {
    /// The verdict is a pure function of the results.
    #[test]
    fn aggregation_is_deterministic(
        results in prop::collection::vec(result_strategy(), 0..8),
        expected in direction_strategy(),
    ) {
        let first = aggregate(&results, expected);
        let second = aggregate(&results, expected);
        prop_assert_eq!(first, second);
    }

    /// Validation requires a supporting significant test and no opposing one.
    #[test]
    fn validation_matches_its_definition(
        results in prop::collection::vec(result_strategy(), 0..8),
        expected in direction_strategy(),
    ) {
        let verdict = aggregate(&results, expected);
        let supporting = results.iter().any(|r| {
            r.p_value.is_some() && r.is_significant && r.effect_direction == expected
        });
        let opposing = results.iter().any(|r| {
            r.p_value.is_some() && r.is_significant && r.effect_direction == expected.opposite()
        });
        prop_assert_eq!(verdict.validated, supporting && !opposing);
    }

    /// Pooled effect sizes stay non-negative (inputs are magnitudes).
    #[test]
    fn pooled_effect_is_nonnegative(
        results in prop::collection::vec(result_strategy(), 0..8),
    ) {
        let verdict = aggregate(&results, EffectDirection::Positive);
        prop_assert!(verdict.pooled_effect_size >= 0.0);
    }
}

/// With the mediator column randomly permuted there is no mediated path:
/// the indirect effect's 95% interval should cover zero in at least 90%
/// of seeds.
#[test]
fn permuted_mediator_interval_covers_zero() {
    let kernel = StatKernel::new(StatsConfig::default());
    let seeds = 20;
    let mut covered = 0;

    for seed in 0..seeds {
        let mut rng = SplitMix64::new(1000 + seed);
        let n = 300;
        let t: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        // A real mediator, then permuted: the path is destroyed.
        let mut m: Vec<f64> = t.iter().map(|t| 1.5 * t + rng.gauss()).collect();
        rng.shuffle(&mut m);
        let y: Vec<f64> = t
            .iter()
            .map(|t| 0.3 * t + 0.1 * rng.gauss())
            .collect();

        let dataset = Dataset::from_columns(vec![
            Column::numeric("t", t),
            Column::numeric("m", m),
            Column::numeric("y", y),
        ])
        .unwrap();

        let outcome = kernel
            .mediation_decomposition(&dataset, "t", "m", "y", &[])
            .unwrap();
        let (low, high) = outcome.indirect_ci;
        if low <= 0.0 && 0.0 <= high {
            covered += 1;
        }
    }

    assert!(
        covered >= 18,
        "indirect CI covered zero in only {covered}/{seeds} seeds"
    );
}
