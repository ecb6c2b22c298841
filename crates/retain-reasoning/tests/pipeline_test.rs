//! Pipeline invariants: derived counts, validation transitions, snapshot
//! ordering, cancellation, idempotence, and catalog compliance.

mod common;

use std::sync::Mutex;

use retain_core::models::{SessionStatus, Stage, StageSnapshot};
use retain_core::traits::ISnapshotObserver;
use retain_fixtures::{mediated_catalog, mediated_churn_dataset, referral_churn_opportunity};
use retain_reasoning::CancelToken;

use common::{engine, mediated_scenario_model};

#[derive(Default)]
struct SnapshotRecorder {
    snapshots: Mutex<Vec<StageSnapshot>>,
}

impl ISnapshotObserver for SnapshotRecorder {
    fn on_snapshot(&self, snapshot: &StageSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}

#[test]
fn derived_counts_match_the_hypothesis_list() {
    let engine = engine(mediated_scenario_model());
    let session = engine.analyze(
        &referral_churn_opportunity(),
        &mediated_churn_dataset(600, 41),
        &mediated_catalog(),
        None,
    );

    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.hypotheses_count, session.hypotheses.len());
    assert_eq!(
        session.validated_hypotheses_count,
        session
            .hypotheses
            .iter()
            .filter(|h| h.validated == Some(true))
            .count()
    );
    let expected_causes: Vec<String> = {
        let mut seen = Vec::new();
        for hypothesis in &session.hypotheses {
            if hypothesis.validated == Some(true) {
                if let Some(structure) = &hypothesis.causal_structure {
                    if !seen.contains(&structure.true_cause) {
                        seen.push(structure.true_cause.clone());
                    }
                }
            }
        }
        seen
    };
    assert_eq!(session.validated_causes, expected_causes);
}

#[test]
fn validation_is_ruled_only_by_the_testing_stage() {
    let engine = engine(mediated_scenario_model());
    let recorder = SnapshotRecorder::default();
    engine.analyze_with_observer(
        &referral_churn_opportunity(),
        &mediated_churn_dataset(600, 41),
        &mediated_catalog(),
        None,
        &CancelToken::new(),
        &recorder,
    );

    let snapshots = recorder.snapshots.lock().unwrap();
    for snapshot in snapshots.iter() {
        let all_ruled = snapshot.session.hypotheses.iter().all(|h| h.validated.is_some());
        let none_ruled = snapshot.session.hypotheses.iter().all(|h| h.validated.is_none());
        match snapshot.stage {
            Stage::HypothesisGeneration | Stage::ConfounderAnalysis => {
                assert!(none_ruled, "validated set before testing at {:?}", snapshot.stage);
            }
            Stage::CausalTesting
            | Stage::LeverEstimation
            | Stage::Explanation
            | Stage::Complete => {
                assert!(all_ruled, "validated missing after testing at {:?}", snapshot.stage);
            }
        }
    }
}

#[test]
fn snapshots_arrive_in_stage_order_ending_with_complete() {
    let engine = engine(mediated_scenario_model());
    let recorder = SnapshotRecorder::default();
    engine.analyze_with_observer(
        &referral_churn_opportunity(),
        &mediated_churn_dataset(600, 41),
        &mediated_catalog(),
        None,
        &CancelToken::new(),
        &recorder,
    );

    let stages: Vec<Stage> = recorder
        .snapshots
        .lock()
        .unwrap()
        .iter()
        .map(|s| s.stage)
        .collect();
    assert_eq!(
        stages,
        vec![
            Stage::HypothesisGeneration,
            Stage::ConfounderAnalysis,
            Stage::CausalTesting,
            Stage::LeverEstimation,
            Stage::Explanation,
            Stage::Complete,
        ]
    );
}

#[test]
fn cancel_before_any_stage_terminates_immediately() {
    let engine = engine(mediated_scenario_model());
    let token = CancelToken::new();
    token.cancel();

    let session = engine.analyze_with_observer(
        &referral_churn_opportunity(),
        &mediated_churn_dataset(600, 41),
        &mediated_catalog(),
        None,
        &token,
        &retain_core::traits::NullObserver,
    );

    assert_eq!(session.status, SessionStatus::Cancelled);
    assert!(session.hypotheses.is_empty());
    assert!(session.reasoning_chain.is_none());
}

#[test]
fn every_hypothesis_references_dataset_columns() {
    let dataset = mediated_churn_dataset(600, 41);
    let engine = engine(mediated_scenario_model());
    let session = engine.analyze(
        &referral_churn_opportunity(),
        &dataset,
        &mediated_catalog(),
        None,
    );

    for hypothesis in &session.hypotheses {
        assert!(dataset.has_column(&hypothesis.cause), "{}", hypothesis.cause);
        assert!(dataset.has_column(&hypothesis.effect), "{}", hypothesis.effect);
    }
}

/// Same inputs and the same scripted model produce the same session,
/// modulo ids and timestamps.
#[test]
fn pipeline_is_idempotent_modulo_ids() {
    let run = || {
        let engine = engine(mediated_scenario_model());
        engine.analyze(
            &referral_churn_opportunity(),
            &mediated_churn_dataset(600, 41),
            &mediated_catalog(),
            None,
        )
    };
    let first = run();
    let second = run();

    assert_eq!(first.status, second.status);
    assert_eq!(first.hypotheses_count, second.hypotheses_count);
    assert_eq!(first.validated_causes, second.validated_causes);
    assert_eq!(first.confidence_score, second.confidence_score);
    assert_eq!(first.completeness_score, second.completeness_score);

    let shape = |session: &retain_core::models::ReasoningSession| {
        session
            .hypotheses
            .iter()
            .map(|h| {
                (
                    h.cause.clone(),
                    h.effect.clone(),
                    h.validated,
                    h.test_results
                        .iter()
                        .map(|r| (r.method, r.is_significant, r.p_value))
                        .collect::<Vec<_>>(),
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&first), shape(&second));

    let lever_shape = |session: &retain_core::models::ReasoningSession| {
        session
            .recommended_levers
            .iter()
            .map(|l| (l.name.clone(), l.expected_impact, l.effort))
            .collect::<Vec<_>>()
    };
    assert_eq!(lever_shape(&first), lever_shape(&second));

    let chain_first = first.reasoning_chain.as_ref().unwrap();
    let chain_second = second.reasoning_chain.as_ref().unwrap();
    assert_eq!(chain_first.summary, chain_second.summary);
    assert_eq!(chain_first.steps.len(), chain_second.steps.len());
    assert_eq!(chain_first.caveats, chain_second.caveats);
}

#[test]
fn missing_outcome_column_fails_before_generation() {
    let engine = engine(mediated_scenario_model());
    let mut opportunity = referral_churn_opportunity();
    opportunity.metric_name = "retention_90d".to_string();

    let session = engine.analyze(
        &referral_churn_opportunity(),
        &mediated_churn_dataset(600, 41),
        &mediated_catalog(),
        None,
    );
    assert_eq!(session.status, SessionStatus::Completed);

    let failed = engine.analyze(
        &opportunity,
        &mediated_churn_dataset(600, 41),
        &mediated_catalog(),
        None,
    );
    assert_eq!(failed.status, SessionStatus::Failed);
    assert!(failed
        .error_message
        .as_ref()
        .unwrap()
        .contains("retention_90d"));
    assert!(failed.hypotheses.is_empty());
}

#[test]
fn terminal_sessions_land_in_the_registry() {
    let engine = engine(mediated_scenario_model());
    let session = engine.analyze(
        &referral_churn_opportunity(),
        &mediated_churn_dataset(600, 41),
        &mediated_catalog(),
        None,
    );

    let stored = engine.registry().get(&session.id).unwrap();
    assert_eq!(stored.status, session.status);
    assert_eq!(engine.registry().count(), 1);
}
