//! Stage 5: explanation generation. A deterministic chain is assembled
//! from the structured results; the LLM is asked only for narrative
//! polish, and any model failure falls back to the template so sessions
//! always complete.

use retain_core::constants;
use retain_core::models::{
    Opportunity, ReasoningChain, ReasoningSession, ReasoningStep, TestResult,
};
use retain_data::DataProfile;
use retain_stats::aggregate;
use tracing::warn;

use crate::llm::payloads;
use crate::llm::{prompts, StructuredClient};
use crate::util::humanize;

/// Produces the reasoning chain for a tested session.
pub struct ExplanationGenerator<'a> {
    client: &'a StructuredClient,
}

impl<'a> ExplanationGenerator<'a> {
    pub fn new(client: &'a StructuredClient) -> Self {
        Self { client }
    }

    pub fn generate(
        &self,
        session: &ReasoningSession,
        opportunity: &Opportunity,
        profile: &DataProfile,
    ) -> ReasoningChain {
        let mut chain = self.build_template(session, opportunity, profile);
        self.polish_with_model(&mut chain, opportunity);
        chain
    }

    /// Deterministic chain assembly from the structured data.
    fn build_template(
        &self,
        session: &ReasoningSession,
        opportunity: &Opportunity,
        profile: &DataProfile,
    ) -> ReasoningChain {
        let mut chain = ReasoningChain::new(&session.id);
        let mut step_number = 0;

        for hypothesis in &session.hypotheses {
            if hypothesis.validated != Some(true) {
                continue;
            }
            step_number += 1;
            let verdict = aggregate(&hypothesis.test_results, hypothesis.expected_direction());
            let evidence = dominant_evidence(&hypothesis.test_results)
                .unwrap_or_else(|| "no executed test".to_string());
            chain.steps.push(ReasoningStep {
                step_number,
                claim: format!(
                    "{} drives {}",
                    humanize(&hypothesis.cause),
                    humanize(&hypothesis.effect)
                ),
                evidence,
                confidence: verdict.confidence,
                reasoning: None,
            });
        }

        // Mediation insight: called out when the routed effect dominates.
        let mediated = session.hypotheses.iter().find_map(|h| {
            let structure = h.causal_structure.as_ref()?;
            (h.validated == Some(true)
                && !structure.mediators.is_empty()
                && structure.indirect_effect.abs() > structure.direct_effect.abs())
            .then_some((h, structure))
        });
        if let Some((hypothesis, structure)) = mediated {
            step_number += 1;
            chain.steps.push(ReasoningStep {
                step_number,
                claim: format!(
                    "the effect of {} runs mostly through {}",
                    humanize(&hypothesis.cause),
                    humanize(&structure.true_cause)
                ),
                evidence: format!(
                    "indirect effect {:.3} vs direct effect {:.3}",
                    structure.indirect_effect, structure.direct_effect
                ),
                confidence: aggregate(&hypothesis.test_results, hypothesis.expected_direction())
                    .confidence,
                reasoning: None,
            });
        }

        if let Some(primary) = session.recommended_levers.first() {
            chain.primary_lever = primary.name.clone();
            chain.secondary_levers = session
                .recommended_levers
                .iter()
                .skip(1)
                .take(2)
                .map(|l| l.name.clone())
                .collect();
            chain.expected_impact = format!(
                "{:.1} percentage-point reduction in {} across {} affected customers",
                primary.expected_impact * 100.0,
                opportunity.metric_name,
                opportunity.sample_size
            );
            chain.summary = format!(
                "{} is best addressed through {}",
                opportunity.title, primary.name
            );
            chain.conclusion = format!(
                "Focus on {}: it carries the strongest causal evidence and the \
                 largest expected impact.",
                primary.name
            );
        } else {
            chain.summary = format!("No validated causal driver found for {}", opportunity.title);
            chain.conclusion =
                "No intervention is recommended: none of the tested hypotheses survived \
                 causal scrutiny."
                    .to_string();
            chain.expected_impact = "none established".to_string();
        }

        chain.caveats = self.caveats(session, profile);
        chain.overall_confidence = if chain.steps.is_empty() {
            0.0
        } else {
            chain
                .steps
                .iter()
                .map(|s| s.confidence.weight())
                .sum::<f64>()
                / chain.steps.len() as f64
        };
        chain
    }

    fn caveats(&self, session: &ReasoningSession, profile: &DataProfile) -> Vec<String> {
        let mut caveats = Vec::new();

        if profile.row_count < constants::SMALL_COHORT_SIZE {
            caveats.push(format!(
                "small sample ({} rows); effect estimates are imprecise",
                profile.row_count
            ));
        }
        for column in profile.high_missingness(constants::CAVEAT_MISSINGNESS_FRACTION) {
            caveats.push(format!(
                "column '{}' is {:.0}% missing",
                column.name,
                column.missingness * 100.0
            ));
        }
        for hypothesis in &session.hypotheses {
            for result in &hypothesis.test_results {
                if !result.was_executed() {
                    let reason = result
                        .warnings
                        .first()
                        .cloned()
                        .unwrap_or_else(|| "not feasible".to_string());
                    caveats.push(format!(
                        "{} skipped for '{}': {}",
                        result.method.as_str(),
                        hypothesis.cause,
                        reason
                    ));
                }
            }
        }
        if session.validated_hypotheses_count == 0 {
            caveats.push(
                "lack of causal evidence: observed correlations may be driven by \
                 confounding"
                    .to_string(),
            );
        }
        caveats
    }

    /// Ask the model for summary/conclusion/step prose; keep the template
    /// on any failure.
    fn polish_with_model(&self, chain: &mut ReasoningChain, opportunity: &Opportunity) {
        if chain.steps.is_empty() {
            return;
        }
        let claims: Vec<String> = chain.steps.iter().map(|s| s.claim.clone()).collect();
        let prompt = prompts::narrative_prompt(
            opportunity,
            &claims,
            &chain.primary_lever,
            &chain.expected_impact,
        );
        match self.client.request(
            prompts::NARRATIVE_SYSTEM_PROMPT,
            &prompt,
            prompts::NARRATIVE_SCHEMA_NAME,
            payloads::parse_narrative,
        ) {
            Ok(narrative) => {
                chain.summary = narrative.summary;
                chain.conclusion = narrative.conclusion;
                for step_narrative in narrative.steps {
                    if let Some(step) = chain
                        .steps
                        .iter_mut()
                        .find(|s| s.step_number == step_narrative.step_number)
                    {
                        step.reasoning = step_narrative.reasoning;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "narrative generation failed; using template text");
            }
        }
    }
}

/// Evidence line for the executed test with the smallest p-value.
fn dominant_evidence(results: &[TestResult]) -> Option<String> {
    results
        .iter()
        .filter(|r| r.was_executed())
        .min_by(|a, b| {
            let pa = a.p_value.unwrap_or(1.0);
            let pb = b.p_value.unwrap_or(1.0);
            pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|r| {
            format!(
                "{}: p={:.4}, effect size={:.2}",
                r.method.as_str(),
                r.p_value.unwrap_or(1.0),
                r.effect_size.unwrap_or(0.0)
            )
        })
}
