//! # retain-fixtures
//!
//! Shared test fixtures: a deterministic PRNG, synthetic datasets with
//! known causal structure, and a scripted language model. Test-only.

pub mod datasets;
pub mod rng;
pub mod scripted;

pub use datasets::{
    confounded_catalog, confounded_dataset, lagged_series_dataset, mediated_catalog,
    mediated_churn_dataset, referral_churn_opportunity,
};
pub use rng::SplitMix64;
pub use scripted::{ScriptedModel, ScriptedResponse};
