//! Recommended intervention levers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hypothesis::Confidence;
use crate::ids;

/// Implementation effort bucket for a lever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    /// Delivery timeframe implied by the effort bucket.
    pub fn timeframe(&self) -> &'static str {
        match self {
            Self::Low => "2 weeks",
            Self::Medium => "4-6 weeks",
            Self::High => "one quarter",
        }
    }
}

/// A recommended intervention, ranked by expected impact and confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lever {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Expected fractional reduction in the outcome, clamped to [0, 1].
    pub expected_impact: f64,
    pub confidence: Confidence,
    pub effort: Effort,
    pub timeframe: String,
    pub created_at: DateTime<Utc>,
}

impl Lever {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_impact: f64,
        confidence: Confidence,
        effort: Effort,
    ) -> Self {
        Self {
            id: ids::next_id("lever"),
            name: name.into(),
            description: description.into(),
            expected_impact: expected_impact.clamp(0.0, 1.0),
            confidence,
            effort,
            timeframe: effort.timeframe().to_string(),
            created_at: Utc::now(),
        }
    }

    /// Ranking score: impact discounted by confidence weight.
    pub fn rank_score(&self) -> f64 {
        self.expected_impact * self.confidence.weight()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_is_clamped_and_timeframe_follows_effort() {
        let lever = Lever::new("Fix onboarding", "", 1.7, Confidence::High, Effort::Low);
        assert_eq!(lever.expected_impact, 1.0);
        assert_eq!(lever.timeframe, "2 weeks");
    }

    #[test]
    fn rank_score_discounts_by_confidence() {
        let strong = Lever::new("a", "", 0.5, Confidence::High, Effort::Medium);
        let weak = Lever::new("b", "", 0.5, Confidence::Low, Effort::Medium);
        assert!(strong.rank_score() > weak.rank_score());
    }
}
