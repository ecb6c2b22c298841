//! Shared helpers for the scenario and pipeline tests.
#![allow(dead_code)]

use std::sync::Arc;

use retain_core::config::RetainConfig;
use retain_fixtures::ScriptedModel;
use retain_reasoning::llm::prompts::{
    CLASSIFICATION_SCHEMA_NAME, HYPOTHESIS_SCHEMA_NAME, NARRATIVE_SCHEMA_NAME,
};
use retain_reasoning::ReasoningEngine;
use serde_json::{json, Value};

pub fn engine(model: Arc<ScriptedModel>) -> ReasoningEngine {
    ReasoningEngine::new(model, RetainConfig::default())
}

pub fn hypothesis_value(
    cause: &str,
    effect: &str,
    mechanism: &str,
    confounders: &[&str],
    mediators: &[&str],
    methods: &[&str],
) -> Value {
    json!({
        "cause": cause,
        "effect": effect,
        "mechanism": mechanism,
        "rationale": format!("{cause} is plausibly upstream of {effect}"),
        "confounders": confounders,
        "mediators": mediators,
        "moderators": [],
        "test_methods": methods,
        "likelihood": "high",
    })
}

pub fn batch_value(hypotheses: Vec<Value>) -> Value {
    json!({ "hypotheses": hypotheses })
}

pub fn classification_value(entries: &[(&str, &str)]) -> Value {
    json!({
        "classifications": entries
            .iter()
            .map(|(variable, role)| json!({"variable": variable, "role": role}))
            .collect::<Vec<_>>()
    })
}

pub fn narrative_value(summary: &str, conclusion: &str) -> Value {
    json!({
        "summary": summary,
        "conclusion": conclusion,
        "steps": [{"step_number": 1, "reasoning": "the matched and adjusted estimates agree"}],
    })
}

/// Scripted model preloaded for the mediated-churn scenario: one honest
/// hypothesis plus two that skip deterministically.
pub fn mediated_scenario_model() -> Arc<ScriptedModel> {
    let model = Arc::new(ScriptedModel::new());
    model.set_default(
        HYPOTHESIS_SCHEMA_NAME,
        batch_value(vec![
            hypothesis_value(
                "late_delivery",
                "churn_30d",
                "Late first deliveries erode trust and push customers to churn",
                &["tenure_days"],
                &["low_onboarding_engagement"],
                &["propensity_matching", "regression_adjustment"],
            ),
            hypothesis_value(
                "channel",
                "churn_30d",
                "Acquisition channel shapes expectations and churn",
                &[],
                &[],
                &["regression_adjustment"],
            ),
            hypothesis_value(
                "tenure_days",
                "churn_30d",
                "Short-tenure customers churn at higher rates",
                &[],
                &[],
                &["granger_causality"],
            ),
        ]),
    );
    model.set_default(
        CLASSIFICATION_SCHEMA_NAME,
        classification_value(&[
            ("tenure_days", "confounder"),
            ("low_onboarding_engagement", "mediator"),
        ]),
    );
    model.set_default(
        NARRATIVE_SCHEMA_NAME,
        narrative_value(
            "Referral churn is driven by poor onboarding after late deliveries",
            "Invest in onboarding recovery for late-delivery customers",
        ),
    );
    model
}
