//! Prompt builders for the three LLM-backed stages. Each prompt embeds a
//! JSON-schema excerpt fixing the output shape.

use retain_core::models::{Hypothesis, Opportunity};
use retain_data::DataProfile;

pub const HYPOTHESIS_SCHEMA_NAME: &str = "hypothesis_batch";
pub const CLASSIFICATION_SCHEMA_NAME: &str = "variable_classification";
pub const NARRATIVE_SCHEMA_NAME: &str = "reasoning_narrative";

pub const HYPOTHESIS_SYSTEM_PROMPT: &str = "\
You are a retention data scientist specializing in causal analysis.
Generate testable causal hypotheses explaining the retention deviation.
Focus on actionable causes, respect temporal ordering, and be skeptical of
obvious correlations. Return ONLY a JSON object matching the schema.";

const HYPOTHESIS_SCHEMA: &str = r#"{
  "hypotheses": [
    {
      "cause": "<feature name from the catalog>",
      "effect": "<the outcome metric>",
      "mechanism": "<one sentence: why would cause move effect>",
      "rationale": "<why this is plausible>",
      "confounders": ["<catalog feature>"],
      "mediators": ["<catalog feature>"],
      "moderators": [],
      "test_methods": ["granger_causality" | "propensity_matching" | "regression_adjustment" | "regression_discontinuity" | "instrumental_variables" | "difference_in_differences" | "synthetic_control" | "dag_based"],
      "likelihood": "low" | "medium" | "high"
    }
  ]
}"#;

/// The generator's user prompt: opportunity context, feature catalog with
/// profile statistics, and the schema contract.
pub fn hypothesis_generation_prompt(
    opportunity: &Opportunity,
    profile: &DataProfile,
    business_context: Option<&str>,
    min_hypotheses: usize,
    max_hypotheses: usize,
) -> String {
    let mut catalog_lines = Vec::new();
    for column in &profile.columns {
        let mut parts = vec![format!("- {} ({})", column.name, column.semantic_type.as_str())];
        if let Some(prevalence) = column.prevalence {
            parts.push(format!("prevalence {prevalence:.2}"));
        }
        if let Some(correlation) = column.outcome_correlation {
            parts.push(format!("corr with outcome {correlation:+.2}"));
        }
        if column.missingness > 0.0 {
            parts.push(format!("{:.0}% missing", column.missingness * 100.0));
        }
        catalog_lines.push(parts.join(", "));
    }

    let business_section = business_context
        .map(|ctx| format!("\n## Business context\n{ctx}\n"))
        .unwrap_or_default();

    format!(
        "{opportunity_context}\n\n\
         ## Available features\n\
         {catalog}\n\n\
         Use ONLY these exact feature names as causes and confounders. The \
         effect field must be \"{outcome}\".\n\
         {business_section}\n\
         ## Task\n\
         Generate {min_hypotheses}-{max_hypotheses} testable causal hypotheses with distinct \
         (cause, effect) pairs. For each, name the mechanism, expected \
         confounders from the catalog, and a non-empty subset of the allowed \
         test methods.\n\n\
         ## Output schema\n{schema}",
        opportunity_context = opportunity.to_context_string(),
        catalog = catalog_lines.join("\n"),
        outcome = profile.outcome,
        schema = HYPOTHESIS_SCHEMA,
    )
}

pub const CLASSIFICATION_SYSTEM_PROMPT: &str = "\
You are a causal inference expert analyzing confounding structures.
Confounders influence both treatment and outcome; mediators sit on the
causal path; colliders are caused by both and must not be conditioned on.
Return ONLY a JSON object matching the schema.";

const CLASSIFICATION_SCHEMA: &str = r#"{
  "classifications": [
    {"variable": "<candidate name>", "role": "confounder" | "mediator" | "collider" | "irrelevant"}
  ]
}"#;

/// The analyzer's user prompt: the hypothesis, the candidate variables,
/// and their profile rows.
pub fn classification_prompt(
    hypothesis: &Hypothesis,
    candidates: &[String],
    profile: &DataProfile,
) -> String {
    let candidate_lines: Vec<String> = candidates
        .iter()
        .map(|name| match profile.column(name) {
            Some(column) => format!(
                "- {} ({}, corr with outcome {})",
                name,
                column.semantic_type.as_str(),
                column
                    .outcome_correlation
                    .map(|r| format!("{r:+.2}"))
                    .unwrap_or_else(|| "n/a".to_string()),
            ),
            None => format!("- {name}"),
        })
        .collect();

    format!(
        "{hypothesis}\n\n\
         ## Candidate variables\n{candidates}\n\n\
         ## Task\n\
         Classify each candidate's role relative to the hypothesis: \
         confounder (influences both {cause} and {effect}), mediator (on \
         the path {cause} -> candidate -> {effect}), collider (caused by \
         both), or irrelevant.\n\n\
         ## Output schema\n{schema}",
        hypothesis = hypothesis.to_prompt_string(),
        candidates = candidate_lines.join("\n"),
        cause = hypothesis.cause,
        effect = hypothesis.effect,
        schema = CLASSIFICATION_SCHEMA,
    )
}

pub const NARRATIVE_SYSTEM_PROMPT: &str = "\
You are a data storyteller translating causal analysis into clear,
actionable insight. Lead with the finding, use concrete numbers, and
acknowledge uncertainty. Return ONLY a JSON object matching the schema.";

const NARRATIVE_SCHEMA: &str = r#"{
  "summary": "<one-sentence key finding>",
  "conclusion": "<main conclusion naming the top lever>",
  "steps": [
    {"step_number": 1, "reasoning": "<one sentence of narrative logic for this step>"}
  ]
}"#;

/// The explanation stage's user prompt: validated findings and the ranked
/// levers, asking for narrative polish over the deterministic skeleton.
pub fn narrative_prompt(
    opportunity: &Opportunity,
    step_claims: &[String],
    primary_lever: &str,
    expected_impact: &str,
) -> String {
    let steps: Vec<String> = step_claims
        .iter()
        .enumerate()
        .map(|(i, claim)| format!("{}. {claim}", i + 1))
        .collect();
    format!(
        "## Retention issue\n{context}\n\n\
         ## Established findings\n{steps}\n\n\
         ## Recommendation\nPrimary lever: {primary_lever}\nExpected impact: {expected_impact}\n\n\
         ## Task\n\
         Write a one-sentence summary, a conclusion naming the primary \
         lever, and one sentence of reasoning per numbered finding.\n\n\
         ## Output schema\n{schema}",
        context = opportunity.to_context_string(),
        steps = steps.join("\n"),
        schema = NARRATIVE_SCHEMA,
    )
}
