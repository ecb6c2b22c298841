//! Reasoning chain and the session record threaded through all stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hypothesis::{Confidence, Hypothesis};
use super::lever::Lever;
use super::snapshot::Stage;
use crate::ids;

/// One numbered claim in the reasoning chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub step_number: usize,
    pub claim: String,
    /// Supporting statistics: method, p-value, effect size.
    pub evidence: String,
    pub confidence: Confidence,
    pub reasoning: Option<String>,
}

/// The ordered narrative justifying the recommended levers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningChain {
    pub id: String,
    pub session_id: String,

    pub summary: String,
    pub conclusion: String,
    pub steps: Vec<ReasoningStep>,

    pub primary_lever: String,
    pub secondary_levers: Vec<String>,
    /// Human-readable impact estimate.
    pub expected_impact: String,

    pub overall_confidence: f64,
    pub caveats: Vec<String>,

    pub created_at: DateTime<Utc>,
}

impl ReasoningChain {
    pub fn new(session_id: &str) -> Self {
        Self {
            id: ids::next_id("chain"),
            session_id: session_id.to_string(),
            summary: String::new(),
            conclusion: String::new(),
            steps: Vec::new(),
            primary_lever: String::new(),
            secondary_levers: Vec::new(),
            expected_impact: String::new(),
            overall_confidence: 0.0,
            caveats: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Render the chain as a markdown report.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![format!("# {}", self.summary), String::new()];
        lines.push("## Analysis".to_string());
        lines.push(String::new());
        for step in &self.steps {
            lines.push(format!("### Step {}: {}", step.step_number, step.claim));
            lines.push(format!("**Evidence:** {}", step.evidence));
            lines.push(format!("**Confidence:** {}", step.confidence.as_str()));
            if let Some(reasoning) = &step.reasoning {
                lines.push(format!("**Reasoning:** {reasoning}"));
            }
            lines.push(String::new());
        }
        lines.push("## Conclusion".to_string());
        lines.push(String::new());
        lines.push(self.conclusion.clone());
        lines.push(String::new());
        lines.push(format!("**Primary lever:** {}", self.primary_lever));
        lines.push(format!("**Expected impact:** {}", self.expected_impact));
        if !self.secondary_levers.is_empty() {
            lines.push("**Secondary levers:**".to_string());
            for lever in &self.secondary_levers {
                lines.push(format!("- {lever}"));
            }
        }
        if !self.caveats.is_empty() {
            lines.push(String::new());
            lines.push("## Caveats".to_string());
            for caveat in &self.caveats {
                lines.push(format!("- {caveat}"));
            }
        }
        lines.push(String::new());
        lines.push(format!(
            "**Overall confidence:** {:.0}%",
            self.overall_confidence * 100.0
        ));
        lines.join("\n")
    }
}

/// Lifecycle of a reasoning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Root record for one end-to-end analysis run.
///
/// Owned by the orchestrator and mutated by exactly one stage at a time.
/// Terminal statuses freeze the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningSession {
    pub id: String,
    pub opportunity_id: String,
    pub status: SessionStatus,

    pub hypotheses: Vec<Hypothesis>,
    pub hypotheses_count: usize,
    pub validated_hypotheses_count: usize,

    /// Deduplicated `true_cause` values of validated hypotheses,
    /// in declared hypothesis order.
    pub validated_causes: Vec<String>,
    pub recommended_levers: Vec<Lever>,
    pub reasoning_chain: Option<ReasoningChain>,

    pub confidence_score: f64,
    pub completeness_score: f64,

    pub error_message: Option<String>,
    /// Stage where a failed session stopped.
    pub failed_stage: Option<Stage>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReasoningSession {
    pub fn new(opportunity_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: ids::next_id("sess"),
            opportunity_id: opportunity_id.to_string(),
            status: SessionStatus::InProgress,
            hypotheses: Vec::new(),
            hypotheses_count: 0,
            validated_hypotheses_count: 0,
            validated_causes: Vec::new(),
            recommended_levers: Vec::new(),
            reasoning_chain: None,
            confidence_score: 0.0,
            completeness_score: 0.0,
            error_message: None,
            failed_stage: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn add_hypothesis(&mut self, hypothesis: Hypothesis) {
        self.hypotheses.push(hypothesis);
        self.hypotheses_count = self.hypotheses.len();
        self.touch();
    }

    /// Recompute derived counts and the validated-cause list from the
    /// hypotheses. Called by the tester after all results land.
    pub fn recount(&mut self) {
        self.hypotheses_count = self.hypotheses.len();
        self.validated_hypotheses_count = self
            .hypotheses
            .iter()
            .filter(|h| h.validated == Some(true))
            .count();
        self.validated_causes.clear();
        for hyp in &self.hypotheses {
            if hyp.validated != Some(true) {
                continue;
            }
            if let Some(structure) = &hyp.causal_structure {
                if !self.validated_causes.contains(&structure.true_cause) {
                    self.validated_causes.push(structure.true_cause.clone());
                }
            }
        }
        self.touch();
    }

    pub fn mark_completed(&mut self) {
        self.recount();
        self.status = SessionStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub fn mark_failed(&mut self, stage: Stage, error: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.error_message = Some(error.into());
        self.failed_stage = Some(stage);
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    pub fn mark_cancelled(&mut self) {
        self.status = SessionStatus::Cancelled;
        self.completed_at = Some(Utc::now());
        self.touch();
    }

    /// Compact digest for logs and dashboards.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            status: self.status,
            hypotheses_tested: self.hypotheses_count,
            validated_causes: self.validated_causes.clone(),
            recommended_lever_count: self.recommended_levers.len(),
            confidence_score: self.confidence_score,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Digest of a session, safe to log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub status: SessionStatus,
    pub hypotheses_tested: usize,
    pub validated_causes: Vec<String>,
    pub recommended_lever_count: usize,
    pub confidence_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hypothesis::Likelihood;

    #[test]
    fn recount_tracks_validated_hypotheses() {
        let mut session = ReasoningSession::new("opp_1");
        let mut a = Hypothesis::new(&session.id, "x", "y", "m", Likelihood::High);
        a.validated = Some(true);
        a.causal_structure = Some(crate::models::hypothesis::CausalStructure {
            hypothesis_id: a.id.clone(),
            direct_effect: 0.1,
            indirect_effect: 0.0,
            total_effect: 0.1,
            mediators: vec![],
            confounders: vec![],
            colliders: vec![],
            true_cause: "x".into(),
            proximate_cause: "x".into(),
            actionable_lever: "improve x".into(),
            nodes: vec![],
            edges: vec![],
            structure_confidence: 0.7,
        });
        let mut b = Hypothesis::new(&session.id, "z", "y", "m", Likelihood::Low);
        b.validated = Some(false);
        session.add_hypothesis(a);
        session.add_hypothesis(b);
        session.recount();

        assert_eq!(session.hypotheses_count, 2);
        assert_eq!(session.validated_hypotheses_count, 1);
        assert_eq!(session.validated_causes, vec!["x".to_string()]);
    }

    #[test]
    fn terminal_statuses_are_terminal() {
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(SessionStatus::Cancelled.is_terminal());
    }
}
