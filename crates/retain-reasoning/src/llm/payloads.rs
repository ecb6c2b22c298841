//! Typed payloads for structured LLM responses, with the validation that
//! drives corrective re-prompts.
//!
//! Each `parse_*` function turns a raw JSON value into a typed payload or
//! a human-readable validation error that is fed back to the model.

use serde::Deserialize;
use serde_json::Value;

/// One hypothesis as proposed by the model.
#[derive(Debug, Clone, Deserialize)]
pub struct HypothesisPayload {
    pub cause: String,
    pub effect: String,
    pub mechanism: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub confounders: Vec<String>,
    #[serde(default)]
    pub mediators: Vec<String>,
    #[serde(default)]
    pub moderators: Vec<String>,
    #[serde(default)]
    pub test_methods: Vec<String>,
    #[serde(default = "default_likelihood")]
    pub likelihood: String,
}

fn default_likelihood() -> String {
    "medium".to_string()
}

/// The generator's expected response shape.
#[derive(Debug, Clone, Deserialize)]
pub struct HypothesisBatchPayload {
    pub hypotheses: Vec<HypothesisPayload>,
}

pub fn parse_hypothesis_batch(value: &Value) -> Result<HypothesisBatchPayload, String> {
    let payload: HypothesisBatchPayload = serde_json::from_value(value.clone())
        .map_err(|e| format!("response does not match the hypothesis schema: {e}"))?;
    if payload.hypotheses.is_empty() {
        return Err("the hypotheses array is empty; at least 3 are required".to_string());
    }
    for (i, hypothesis) in payload.hypotheses.iter().enumerate() {
        if hypothesis.cause.trim().is_empty() {
            return Err(format!("hypothesis {} has an empty cause", i + 1));
        }
        if hypothesis.effect.trim().is_empty() {
            return Err(format!("hypothesis {} has an empty effect", i + 1));
        }
        if hypothesis.mechanism.trim().is_empty() {
            return Err(format!("hypothesis {} has an empty mechanism", i + 1));
        }
        if !matches!(hypothesis.likelihood.as_str(), "low" | "medium" | "high") {
            return Err(format!(
                "hypothesis {} has likelihood '{}'; expected low, medium, or high",
                i + 1,
                hypothesis.likelihood
            ));
        }
    }
    Ok(payload)
}

/// Role assignment for one confounder candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableClassification {
    pub variable: String,
    pub role: String,
}

/// The analyzer's expected response shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationPayload {
    pub classifications: Vec<VariableClassification>,
}

pub fn parse_classification(value: &Value) -> Result<ClassificationPayload, String> {
    let payload: ClassificationPayload = serde_json::from_value(value.clone())
        .map_err(|e| format!("response does not match the classification schema: {e}"))?;
    for classification in &payload.classifications {
        if !matches!(
            classification.role.as_str(),
            "confounder" | "mediator" | "collider" | "irrelevant"
        ) {
            return Err(format!(
                "variable '{}' has role '{}'; expected confounder, mediator, collider, or irrelevant",
                classification.variable, classification.role
            ));
        }
    }
    Ok(payload)
}

/// Narrative polish for one reasoning step.
#[derive(Debug, Clone, Deserialize)]
pub struct StepNarrativePayload {
    pub step_number: usize,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// The explanation stage's expected response shape.
#[derive(Debug, Clone, Deserialize)]
pub struct NarrativePayload {
    pub summary: String,
    pub conclusion: String,
    #[serde(default)]
    pub steps: Vec<StepNarrativePayload>,
}

pub fn parse_narrative(value: &Value) -> Result<NarrativePayload, String> {
    let payload: NarrativePayload = serde_json::from_value(value.clone())
        .map_err(|e| format!("response does not match the narrative schema: {e}"))?;
    if payload.summary.trim().is_empty() {
        return Err("summary must not be empty".to_string());
    }
    if payload.conclusion.trim().is_empty() {
        return Err("conclusion must not be empty".to_string());
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_batch_parses() {
        let value = json!({
            "hypotheses": [{
                "cause": "late_delivery",
                "effect": "churn_30d",
                "mechanism": "late orders erode trust",
                "likelihood": "high",
                "test_methods": ["propensity_matching"]
            }]
        });
        let batch = parse_hypothesis_batch(&value).unwrap();
        assert_eq!(batch.hypotheses.len(), 1);
    }

    #[test]
    fn non_object_is_rejected_with_schema_message() {
        let err = parse_hypothesis_batch(&json!("not an object")).unwrap_err();
        assert!(err.contains("schema"), "got: {err}");
    }

    #[test]
    fn bad_likelihood_is_named_in_the_error() {
        let value = json!({
            "hypotheses": [{
                "cause": "a", "effect": "b", "mechanism": "m", "likelihood": "certain"
            }]
        });
        let err = parse_hypothesis_batch(&value).unwrap_err();
        assert!(err.contains("certain"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let value = json!({
            "classifications": [{"variable": "x", "role": "instrument"}]
        });
        assert!(parse_classification(&value).is_err());
    }
}
