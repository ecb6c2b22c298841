use serde::{Deserialize, Serialize};

use super::defaults;

/// Pipeline and LLM-call configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Hard timeout for a single structured LLM call (seconds).
    pub llm_timeout_secs: u64,
    /// Sampling temperature for structured generation.
    pub llm_temperature: f64,
    /// Corrective re-prompts allowed after a schema violation.
    pub retry_budget: u32,
    /// Hypotheses requested from the generator.
    pub min_hypotheses: usize,
    pub max_hypotheses: usize,
    /// |correlation| with both cause and effect above which a catalog
    /// column is swept in as a confounder candidate.
    pub correlation_scan_threshold: f64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            llm_timeout_secs: defaults::DEFAULT_LLM_TIMEOUT_SECS,
            llm_temperature: defaults::DEFAULT_LLM_TEMPERATURE,
            retry_budget: defaults::DEFAULT_RETRY_BUDGET,
            min_hypotheses: defaults::DEFAULT_MIN_HYPOTHESES,
            max_hypotheses: defaults::DEFAULT_MAX_HYPOTHESES,
            correlation_scan_threshold: defaults::DEFAULT_CORRELATION_SCAN_THRESHOLD,
        }
    }
}
