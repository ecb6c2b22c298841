//! The opportunity record: an observed retention deviation handed to the engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids;

/// Categorical kind of retention deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    ChurnSpike,
    RetentionDrop,
    EngagementDecline,
    Custom,
}

/// Qualitative severity of the deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// An observed deviation in a retention metric for some cohort.
///
/// Created by the caller, never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub kind: OpportunityKind,
    pub title: String,
    pub description: String,
    /// Dimension name → value, e.g. `{"channel": "Referral"}`.
    pub affected_cohort: BTreeMap<String, String>,
    /// Outcome column in the dataset.
    pub metric_name: String,
    pub baseline_value: f64,
    pub current_value: f64,
    /// Customers in the affected cohort.
    pub sample_size: usize,
    /// Cohort size below which causal analysis is not attempted.
    pub min_sample_size: usize,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
}

impl Opportunity {
    pub fn new(
        kind: OpportunityKind,
        title: impl Into<String>,
        metric_name: impl Into<String>,
        baseline_value: f64,
        current_value: f64,
        sample_size: usize,
    ) -> Self {
        Self {
            id: ids::next_id("opp"),
            kind,
            title: title.into(),
            description: String::new(),
            affected_cohort: BTreeMap::new(),
            metric_name: metric_name.into(),
            baseline_value,
            current_value,
            sample_size,
            min_sample_size: 100,
            severity: Severity::Medium,
            detected_at: Utc::now(),
        }
    }

    /// Absolute change, current minus baseline.
    pub fn change_magnitude(&self) -> f64 {
        self.current_value - self.baseline_value
    }

    /// Relative change in percent; None when the baseline is zero.
    pub fn change_percent(&self) -> Option<f64> {
        if self.baseline_value == 0.0 {
            None
        } else {
            Some((self.current_value - self.baseline_value) / self.baseline_value * 100.0)
        }
    }

    pub fn has_sufficient_sample(&self) -> bool {
        self.sample_size >= self.min_sample_size
    }

    /// Compact context block for LLM prompts.
    pub fn to_context_string(&self) -> String {
        let cohort = if self.affected_cohort.is_empty() {
            "all customers".to_string()
        } else {
            self.affected_cohort
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let change = self
            .change_percent()
            .map(|p| format!("{p:+.1}%"))
            .unwrap_or_else(|| format!("{:+.3} absolute", self.change_magnitude()));
        format!(
            "Opportunity: {}\nDescription: {}\nMetric: {} (baseline {:.3}, current {:.3}, change {})\nAffected cohort: {} ({} customers)\nSeverity: {:?}",
            self.title,
            self.description,
            self.metric_name,
            self.baseline_value,
            self.current_value,
            change,
            cohort,
            self.sample_size,
            self.severity,
        )
    }
}
