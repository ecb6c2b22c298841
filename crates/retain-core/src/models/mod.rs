//! Domain model: opportunities, hypotheses, test results, levers,
//! reasoning chains, and the session record.

mod hypothesis;
mod lever;
mod opportunity;
mod reasoning;
mod snapshot;

pub use hypothesis::{
    CausalStructure, Confidence, DagEdge, DagNode, EffectDirection, Hypothesis, Likelihood,
    NodeRole, TestMethod, TestResult,
};
pub use lever::{Effort, Lever};
pub use opportunity::{Opportunity, OpportunityKind, Severity};
pub use reasoning::{
    ReasoningChain, ReasoningSession, ReasoningStep, SessionStatus, SessionSummary,
};
pub use snapshot::{ErrorEnvelope, Stage, StageSnapshot};
