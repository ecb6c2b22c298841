//! Stage 1: LLM-backed hypothesis generation.

use retain_core::errors::{ReasoningError, RetainResult};
use retain_core::models::{Hypothesis, Likelihood, Opportunity, TestMethod};
use retain_data::{DataProfile, Dataset};
use tracing::{info, warn};

use crate::llm::payloads::{self, HypothesisPayload};
use crate::llm::{prompts, StructuredClient};

/// Generates 3-10 candidate hypotheses for an opportunity.
pub struct HypothesisGenerator<'a> {
    client: &'a StructuredClient,
}

impl<'a> HypothesisGenerator<'a> {
    pub fn new(client: &'a StructuredClient) -> Self {
        Self { client }
    }

    /// Produce filtered, deduplicated hypotheses. Fails the stage when
    /// fewer than two usable hypotheses survive filtering.
    pub fn generate(
        &self,
        session_id: &str,
        opportunity: &Opportunity,
        profile: &DataProfile,
        dataset: &Dataset,
        business_context: Option<&str>,
    ) -> RetainResult<Vec<Hypothesis>> {
        let config = self.client.config();
        let prompt = prompts::hypothesis_generation_prompt(
            opportunity,
            profile,
            business_context,
            config.min_hypotheses,
            config.max_hypotheses,
        );
        let batch = self.client.request(
            prompts::HYPOTHESIS_SYSTEM_PROMPT,
            &prompt,
            prompts::HYPOTHESIS_SCHEMA_NAME,
            payloads::parse_hypothesis_batch,
        )?;
        let generated = batch.hypotheses.len();

        let mut hypotheses: Vec<Hypothesis> = Vec::new();
        for payload in batch.hypotheses {
            match self.convert(session_id, payload, dataset) {
                Ok(hypothesis) => {
                    let duplicate = hypotheses
                        .iter()
                        .any(|h| h.cause == hypothesis.cause && h.effect == hypothesis.effect);
                    if duplicate {
                        warn!(
                            cause = %hypothesis.cause,
                            effect = %hypothesis.effect,
                            "duplicate (cause, effect) pair dropped"
                        );
                    } else {
                        hypotheses.push(hypothesis);
                    }
                }
                Err(reason) => warn!(%reason, "hypothesis dropped"),
            }
        }
        hypotheses.truncate(config.max_hypotheses);

        if hypotheses.len() < 2 {
            return Err(ReasoningError::InsufficientHypotheses {
                valid: hypotheses.len(),
                generated,
            }
            .into());
        }
        if hypotheses.len() < config.min_hypotheses {
            warn!(
                valid = hypotheses.len(),
                requested = config.min_hypotheses,
                "fewer hypotheses than requested survived filtering"
            );
        }

        info!(
            session_id,
            count = hypotheses.len(),
            "hypothesis generation complete"
        );
        Ok(hypotheses)
    }

    fn convert(
        &self,
        session_id: &str,
        payload: HypothesisPayload,
        dataset: &Dataset,
    ) -> Result<Hypothesis, String> {
        if payload.cause == payload.effect {
            return Err(format!(
                "cause and effect are the same column '{}'",
                payload.cause
            ));
        }
        if !dataset.has_column(&payload.cause) {
            return Err(format!("cause column '{}' not in dataset", payload.cause));
        }
        if !dataset.has_column(&payload.effect) {
            return Err(format!("effect column '{}' not in dataset", payload.effect));
        }

        let likelihood = match payload.likelihood.as_str() {
            "low" => Likelihood::Low,
            "high" => Likelihood::High,
            _ => Likelihood::Medium,
        };

        let mut test_methods: Vec<TestMethod> = Vec::new();
        for raw in &payload.test_methods {
            match TestMethod::parse(raw) {
                Some(method) if !test_methods.contains(&method) => test_methods.push(method),
                Some(_) => {}
                None => warn!(method = %raw, "unknown test method dropped"),
            }
        }
        if test_methods.is_empty() {
            test_methods.push(TestMethod::RegressionAdjustment);
        }

        let mut hypothesis = Hypothesis::new(
            session_id,
            payload.cause,
            payload.effect,
            payload.mechanism,
            likelihood,
        );
        hypothesis.rationale = payload.rationale;
        hypothesis.confounders = payload.confounders;
        hypothesis.mediators = payload.mediators;
        hypothesis.moderators = payload.moderators;
        hypothesis.test_methods = test_methods;
        Ok(hypothesis)
    }
}
