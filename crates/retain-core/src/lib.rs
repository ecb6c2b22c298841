//! # retain-core
//!
//! Foundation crate for the Retain causal reasoning engine.
//! Defines the domain model, error taxonomy, configuration, constants,
//! and the trait seams every other crate in the workspace depends on.

pub mod config;
pub mod constants;
pub mod errors;
pub mod ids;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::RetainConfig;
pub use errors::{RetainError, RetainResult};
pub use models::{
    Confidence, Hypothesis, Lever, Opportunity, ReasoningChain, ReasoningSession, SessionStatus,
    Stage, TestResult,
};
