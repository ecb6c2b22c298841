use serde::{Deserialize, Serialize};

use super::defaults;

/// Statistical-kernel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Significance threshold for all hypothesis tests.
    pub significance_level: f64,
    /// Control neighbours matched per treated unit.
    pub matching_neighbors: usize,
    /// Maximum lag order tried by the Granger test.
    pub granger_max_lag: usize,
    /// Soft wall-clock budget per statistical test (seconds).
    /// Exceeding it records a warning and forces non-significance.
    pub test_budget_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            significance_level: defaults::DEFAULT_SIGNIFICANCE_LEVEL,
            matching_neighbors: defaults::DEFAULT_MATCHING_NEIGHBORS,
            granger_max_lag: defaults::DEFAULT_GRANGER_MAX_LAG,
            test_budget_secs: defaults::DEFAULT_TEST_BUDGET_SECS,
        }
    }
}
