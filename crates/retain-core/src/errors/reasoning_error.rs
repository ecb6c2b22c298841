/// Pipeline-level reasoning errors.
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("fewer than 2 usable hypotheses after filtering ({valid} of {generated} valid)")]
    InsufficientHypotheses { valid: usize, generated: usize },

    #[error("session invariant violated: {detail}")]
    InvariantViolation { detail: String },
}
