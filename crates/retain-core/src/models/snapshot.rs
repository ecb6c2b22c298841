//! Stage snapshots streamed to consumers at each pipeline boundary.

use serde::{Deserialize, Serialize};

use super::reasoning::ReasoningSession;

/// Pipeline stages, in execution order, plus the terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    HypothesisGeneration,
    ConfounderAnalysis,
    CausalTesting,
    LeverEstimation,
    Explanation,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HypothesisGeneration => "hypothesis_generation",
            Self::ConfounderAnalysis => "confounder_analysis",
            Self::CausalTesting => "causal_testing",
            Self::LeverEstimation => "lever_estimation",
            Self::Explanation => "explanation",
            Self::Complete => "complete",
        }
    }
}

/// Envelope emitted to observers after each stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub stage: Stage,
    pub session: ReasoningSession,
}

/// Envelope for failed sessions, shaped for UI display.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub error_message: String,
    pub stage: Stage,
}

impl ErrorEnvelope {
    pub fn new(error_message: impl Into<String>, stage: Stage) -> Self {
        Self {
            status: "failed",
            error_message: error_message.into(),
            stage,
        }
    }

    /// Envelope for a failed session; None for any other status.
    pub fn from_session(session: &ReasoningSession) -> Option<Self> {
        let stage = session.failed_stage?;
        Some(Self::new(
            session.error_message.clone().unwrap_or_default(),
            stage,
        ))
    }
}
