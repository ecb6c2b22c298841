//! Error taxonomy for the Retain engine, one file per subsystem.

mod data_error;
mod llm_error;
mod reasoning_error;
mod stats_error;

pub use data_error::DataError;
pub use llm_error::LlmError;
pub use reasoning_error::ReasoningError;
pub use stats_error::StatsError;

/// Umbrella error for the whole engine.
#[derive(Debug, thiserror::Error)]
pub enum RetainError {
    #[error(transparent)]
    DataError(#[from] DataError),

    #[error(transparent)]
    LlmError(#[from] LlmError),

    #[error(transparent)]
    ReasoningError(#[from] ReasoningError),

    #[error(transparent)]
    StatsError(#[from] StatsError),
}

/// Convenience result alias used across the workspace.
pub type RetainResult<T> = Result<T, RetainError>;
