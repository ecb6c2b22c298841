//! Hypotheses, test results, and the causal structure attached to each.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::ids;

/// Prior plausibility of a hypothesis, before testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Likelihood {
    Low,
    Medium,
    High,
}

/// Qualitative confidence in a test result or reasoning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Classify a standardized effect size.
    pub fn from_effect_size(effect_size: f64) -> Self {
        let magnitude = effect_size.abs();
        if magnitude >= constants::EFFECT_SIZE_HIGH_THRESHOLD {
            Self::High
        } else if magnitude >= constants::EFFECT_SIZE_MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Numeric weight used for ranking and aggregation.
    pub fn weight(&self) -> f64 {
        match self {
            Self::High => constants::CONFIDENCE_WEIGHT_HIGH,
            Self::Medium => constants::CONFIDENCE_WEIGHT_MEDIUM,
            Self::Low => constants::CONFIDENCE_WEIGHT_LOW,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Direction of an estimated effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectDirection {
    Positive,
    Negative,
    None,
}

impl EffectDirection {
    /// Sign of an estimate, with exact zero mapping to `None`.
    pub fn from_estimate(value: f64) -> Self {
        if value > 0.0 {
            Self::Positive
        } else if value < 0.0 {
            Self::Negative
        } else {
            Self::None
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
            Self::None => Self::None,
        }
    }
}

/// Causal inference test methods the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    GrangerCausality,
    PropensityMatching,
    RegressionAdjustment,
    RegressionDiscontinuity,
    InstrumentalVariables,
    DifferenceInDifferences,
    SyntheticControl,
    DagBased,
}

impl TestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrangerCausality => "granger_causality",
            Self::PropensityMatching => "propensity_matching",
            Self::RegressionAdjustment => "regression_adjustment",
            Self::RegressionDiscontinuity => "regression_discontinuity",
            Self::InstrumentalVariables => "instrumental_variables",
            Self::DifferenceInDifferences => "difference_in_differences",
            Self::SyntheticControl => "synthetic_control",
            Self::DagBased => "dag_based",
        }
    }

    /// Tolerant parse for LLM-produced method names. Unknown spellings
    /// return None and are dropped by the caller.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "granger_causality" | "granger" => Some(Self::GrangerCausality),
            "propensity_matching" | "propensity_score_matching" | "psm" => {
                Some(Self::PropensityMatching)
            }
            "regression_adjustment" | "regression" => Some(Self::RegressionAdjustment),
            "regression_discontinuity" | "rdd" => Some(Self::RegressionDiscontinuity),
            "instrumental_variables" | "iv" => Some(Self::InstrumentalVariables),
            "difference_in_differences" | "diff_in_diff" | "did" => {
                Some(Self::DifferenceInDifferences)
            }
            "synthetic_control" => Some(Self::SyntheticControl),
            "dag_based" | "dag" => Some(Self::DagBased),
            _ => None,
        }
    }
}

/// Outcome of one statistical test run against a hypothesis.
///
/// Appended by the tester; never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub hypothesis_id: String,
    pub method: TestMethod,

    pub is_significant: bool,
    pub p_value: Option<f64>,
    /// Standardized effect size (Cohen's d scale).
    pub effect_size: Option<f64>,
    pub effect_direction: EffectDirection,

    pub point_estimate: Option<f64>,
    /// 95% confidence interval.
    pub confidence_interval: Option<(f64, f64)>,
    pub standard_error: Option<f64>,

    pub confidence: Confidence,
    pub sample_size: Option<usize>,
    /// Mean standardized mean difference across covariates (matching only).
    pub balance_score: Option<f64>,

    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TestResult {
    /// A non-significant placeholder for a method the tester could not run.
    pub fn skipped(hypothesis_id: &str, method: TestMethod, reason: impl Into<String>) -> Self {
        Self {
            id: ids::next_id("test"),
            hypothesis_id: hypothesis_id.to_string(),
            method,
            is_significant: false,
            p_value: None,
            effect_size: None,
            effect_direction: EffectDirection::None,
            point_estimate: None,
            confidence_interval: None,
            standard_error: None,
            confidence: Confidence::Low,
            sample_size: None,
            balance_score: None,
            warnings: vec![reason.into()],
            created_at: Utc::now(),
        }
    }

    /// Whether this result came from an actually-executed fit rather than
    /// a skip placeholder.
    pub fn was_executed(&self) -> bool {
        self.p_value.is_some()
    }
}

/// Role of a variable in the causal graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Treatment,
    Outcome,
    Confounder,
    Mediator,
    Collider,
    Moderator,
}

/// A node in the exported causal DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagNode {
    pub id: String,
    pub label: String,
    pub role: NodeRole,
}

/// A directed edge in the exported causal DAG. Endpoints reference node ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagEdge {
    pub source: String,
    pub target: String,
    /// Correlation-based strength estimate.
    pub strength: f64,
}

/// Post-analysis causal summary for one hypothesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalStructure {
    pub hypothesis_id: String,

    /// Treatment → outcome holding mediators fixed.
    pub direct_effect: f64,
    /// Effect routed through mediators.
    pub indirect_effect: f64,
    pub total_effect: f64,

    pub mediators: Vec<String>,
    pub confounders: Vec<String>,
    pub colliders: Vec<String>,

    /// The deepest driver.
    pub true_cause: String,
    /// The surface cause named by the hypothesis.
    pub proximate_cause: String,
    /// Human-readable intervention point.
    pub actionable_lever: String,

    pub nodes: Vec<DagNode>,
    pub edges: Vec<DagEdge>,

    pub structure_confidence: f64,
}

/// A single testable causal claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: String,
    pub session_id: String,

    /// Proposed causal column (or composite condition name).
    pub cause: String,
    /// Outcome column.
    pub effect: String,
    /// Why would cause produce effect?
    pub mechanism: String,
    pub rationale: String,

    pub confounders: Vec<String>,
    pub mediators: Vec<String>,
    pub moderators: Vec<String>,

    pub test_methods: Vec<TestMethod>,
    pub likelihood: Likelihood,

    /// None until the tester rules; set exactly once.
    pub validated: Option<bool>,
    pub test_results: Vec<TestResult>,
    pub causal_structure: Option<CausalStructure>,

    pub created_at: DateTime<Utc>,
    pub tested_at: Option<DateTime<Utc>>,
}

impl Hypothesis {
    pub fn new(
        session_id: &str,
        cause: impl Into<String>,
        effect: impl Into<String>,
        mechanism: impl Into<String>,
        likelihood: Likelihood,
    ) -> Self {
        Self {
            id: ids::next_id("hyp"),
            session_id: session_id.to_string(),
            cause: cause.into(),
            effect: effect.into(),
            mechanism: mechanism.into(),
            rationale: String::new(),
            confounders: Vec::new(),
            mediators: Vec::new(),
            moderators: Vec::new(),
            test_methods: Vec::new(),
            likelihood,
            validated: None,
            test_results: Vec::new(),
            causal_structure: None,
            created_at: Utc::now(),
            tested_at: None,
        }
    }

    /// Expected effect direction, read off the mechanism phrasing.
    /// Negative wording ("reduces churn", "protects against …") flips the
    /// expectation; the default is positive (cause raises the outcome).
    pub fn expected_direction(&self) -> EffectDirection {
        const NEGATIVE_MARKERS: [&str; 6] = [
            "reduce", "decrease", "lower", "protect", "prevent", "mitigate",
        ];
        let text = self.mechanism.to_lowercase();
        if NEGATIVE_MARKERS.iter().any(|m| text.contains(m)) {
            EffectDirection::Negative
        } else {
            EffectDirection::Positive
        }
    }

    /// Compact rendering for LLM prompts.
    pub fn to_prompt_string(&self) -> String {
        let confounders = if self.confounders.is_empty() {
            "none identified".to_string()
        } else {
            self.confounders.join(", ")
        };
        format!(
            "Hypothesis: {} -> {}\nMechanism: {}\nLikelihood: {:?}\nConfounders: {}",
            self.cause, self.effect, self.mechanism, self.likelihood, confounders,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_thresholds_match_canonical_cutoffs() {
        assert_eq!(Confidence::from_effect_size(0.1), Confidence::Low);
        assert_eq!(Confidence::from_effect_size(-0.3), Confidence::Medium);
        assert_eq!(Confidence::from_effect_size(0.5), Confidence::High);
        assert_eq!(Confidence::from_effect_size(-0.8), Confidence::High);
    }

    #[test]
    fn test_method_parse_accepts_common_spellings() {
        assert_eq!(
            TestMethod::parse("Propensity Score Matching"),
            Some(TestMethod::PropensityMatching)
        );
        assert_eq!(TestMethod::parse("granger"), Some(TestMethod::GrangerCausality));
        assert_eq!(TestMethod::parse("DiD"), Some(TestMethod::DifferenceInDifferences));
        assert_eq!(TestMethod::parse("astrology"), None);
    }

    #[test]
    fn mechanism_phrasing_drives_expected_direction() {
        let mut hyp = Hypothesis::new("s", "late_delivery", "churn_30d", "", Likelihood::Medium);
        hyp.mechanism = "Late deliveries frustrate customers and drive churn".into();
        assert_eq!(hyp.expected_direction(), EffectDirection::Positive);
        hyp.mechanism = "Loyalty perks reduce churn in the first month".into();
        assert_eq!(hyp.expected_direction(), EffectDirection::Negative);
    }
}
