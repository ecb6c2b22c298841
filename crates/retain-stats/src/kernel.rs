//! StatKernel — the configured entry point for all statistical tests,
//! enforcing the per-test wall-clock budget.

use std::time::Instant;

use retain_core::config::StatsConfig;
use retain_core::models::TestResult;
use retain_data::Dataset;
use tracing::warn;

use crate::granger;
use crate::mediation::{self, MediationOutcome};
use crate::propensity;
use crate::regression;

/// Configured statistical kernel. Pure over the dataset: no call mutates
/// shared state.
#[derive(Debug, Clone, Default)]
pub struct StatKernel {
    config: StatsConfig,
}

impl StatKernel {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    pub fn propensity_matching(
        &self,
        dataset: &Dataset,
        hypothesis_id: &str,
        treatment: &str,
        outcome: &str,
        confounders: &[String],
    ) -> TestResult {
        let started = Instant::now();
        let mut result = propensity::propensity_matching(
            &self.config,
            dataset,
            hypothesis_id,
            treatment,
            outcome,
            confounders,
        );
        self.enforce_budget(&mut result, started);
        result
    }

    pub fn regression_adjustment(
        &self,
        dataset: &Dataset,
        hypothesis_id: &str,
        treatment: &str,
        outcome: &str,
        controls: &[String],
    ) -> TestResult {
        let started = Instant::now();
        let mut result = regression::regression_adjustment(
            &self.config,
            dataset,
            hypothesis_id,
            treatment,
            outcome,
            controls,
        );
        self.enforce_budget(&mut result, started);
        result
    }

    pub fn granger_lag_test(
        &self,
        xs: &[Option<f64>],
        ys: &[Option<f64>],
        hypothesis_id: &str,
    ) -> TestResult {
        let started = Instant::now();
        let mut result = granger::granger_lag_test(&self.config, xs, ys, hypothesis_id);
        self.enforce_budget(&mut result, started);
        result
    }

    pub fn mediation_decomposition(
        &self,
        dataset: &Dataset,
        treatment: &str,
        mediator: &str,
        outcome: &str,
        confounders: &[String],
    ) -> Option<MediationOutcome> {
        let started = Instant::now();
        let mut outcome = mediation::mediation_decomposition(
            &self.config,
            dataset,
            treatment,
            mediator,
            outcome,
            confounders,
        )?;
        let elapsed = started.elapsed().as_secs();
        if elapsed > self.config.test_budget_secs {
            outcome.warnings.push(format!(
                "mediation decomposition exceeded the {}s budget ({elapsed}s)",
                self.config.test_budget_secs
            ));
        }
        Some(outcome)
    }

    /// Soft budget: an overrun keeps the numbers but voids significance.
    fn enforce_budget(&self, result: &mut TestResult, started: Instant) {
        let elapsed = started.elapsed().as_secs();
        if elapsed > self.config.test_budget_secs {
            warn!(
                method = result.method.as_str(),
                elapsed, "statistical test exceeded its wall-clock budget"
            );
            result.warnings.push(format!(
                "{} exceeded the {}s budget ({elapsed}s); result marked non-significant",
                result.method.as_str(),
                self.config.test_budget_secs
            ));
            result.is_significant = false;
        }
    }
}
