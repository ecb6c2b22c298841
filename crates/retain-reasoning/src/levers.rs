//! Stage 4: lever estimation. One ranked intervention per validated
//! hypothesis, effort inferred from a static keyword table.

use once_cell::sync::Lazy;
use retain_core::models::{Effort, Lever, ReasoningSession};
use retain_stats::aggregate;
use tracing::debug;

use crate::util::humanize;

/// Keyword → effort bucket for common lever families. First match wins;
/// anything unmatched defaults to medium.
static EFFORT_KEYWORDS: Lazy<Vec<(&'static str, Effort)>> = Lazy::new(|| {
    vec![
        ("onboarding", Effort::Medium),
        ("engagement", Effort::Medium),
        ("delivery", Effort::High),
        ("shipping", Effort::High),
        ("pricing", Effort::Low),
        ("discount", Effort::Low),
        ("support", Effort::Medium),
        ("notification", Effort::Low),
    ]
});

/// Ranks actionable interventions from validated hypotheses.
pub struct LeverEstimator;

impl LeverEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Build the ranked, deduplicated lever list.
    pub fn estimate(&self, session: &ReasoningSession) -> Vec<Lever> {
        let mut levers: Vec<Lever> = Vec::new();
        for hypothesis in &session.hypotheses {
            if hypothesis.validated != Some(true) {
                continue;
            }
            let Some(structure) = &hypothesis.causal_structure else {
                continue;
            };

            let name = if structure.actionable_lever.is_empty() {
                humanize(&structure.true_cause)
            } else {
                structure.actionable_lever.clone()
            };
            let verdict = aggregate(&hypothesis.test_results, hypothesis.expected_direction());
            let description = format!(
                "Intervene on {} to move {}. {}",
                name,
                humanize(&hypothesis.effect),
                hypothesis.mechanism
            );

            levers.push(Lever::new(
                name.clone(),
                description,
                structure.total_effect.abs(),
                verdict.confidence,
                infer_effort(&name),
            ));
        }

        levers.sort_by(|a, b| {
            b.rank_score()
                .partial_cmp(&a.rank_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Dedupe by name; the list is sorted, so the first kept is strongest.
        let mut deduped: Vec<Lever> = Vec::new();
        for lever in levers {
            if !deduped.iter().any(|l| l.name == lever.name) {
                deduped.push(lever);
            }
        }

        debug!(count = deduped.len(), "lever estimation complete");
        deduped
    }
}

impl Default for LeverEstimator {
    fn default() -> Self {
        Self::new()
    }
}

fn infer_effort(name: &str) -> Effort {
    let lowered = name.to_lowercase();
    EFFORT_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, effort)| *effort)
        .unwrap_or(Effort::Medium)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_drives_effort() {
        assert_eq!(infer_effort("improve onboarding flow"), Effort::Medium);
        assert_eq!(infer_effort("fix delivery delays"), Effort::High);
        assert_eq!(infer_effort("loyalty pricing tier"), Effort::Low);
        assert_eq!(infer_effort("something else"), Effort::Medium);
    }
}
