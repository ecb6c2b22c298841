//! # retain-stats
//!
//! Statistical kernel: propensity matching, regression adjustment,
//! Granger-style lag tests, mediation decomposition, and the verdict
//! aggregation rule.
//!
//! Data-dependent problems (small samples, collinearity, missing support)
//! never error — they come back as `TestResult` warnings. Only programming
//! errors surface as `StatsError`.

pub mod aggregate;
pub mod granger;
pub mod kernel;
pub mod linalg;
pub mod logit;
pub mod mediation;
pub mod ols;
pub mod prepare;
pub mod propensity;
pub mod regression;

pub use aggregate::{aggregate, Verdict};
pub use kernel::StatKernel;
pub use mediation::MediationOutcome;
