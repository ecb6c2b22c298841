/// Retain engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Effect sizes below this are low-confidence.
pub const EFFECT_SIZE_MEDIUM_THRESHOLD: f64 = 0.2;

/// Effect sizes at or above this are high-confidence.
pub const EFFECT_SIZE_HIGH_THRESHOLD: f64 = 0.5;

/// Numeric weights for qualitative confidence levels (lever ranking,
/// reasoning-chain aggregation).
pub const CONFIDENCE_WEIGHT_HIGH: f64 = 1.0;
pub const CONFIDENCE_WEIGHT_MEDIUM: f64 = 0.66;
pub const CONFIDENCE_WEIGHT_LOW: f64 = 0.33;

/// Minimum rows for a regression fit; below this the test is skipped.
pub const MIN_REGRESSION_ROWS: usize = 30;

/// Regressions on fewer rows than this carry a small-sample warning.
pub const SMALL_SAMPLE_ROWS: usize = 50;

/// Matched-pair count below which propensity matching warns.
pub const MIN_MATCHED_PAIRS: usize = 30;

/// Minimum rows per treatment class for propensity matching.
pub const MIN_ROWS_PER_CLASS: usize = 30;

/// Propensity-score overlap below this fraction triggers a common-support warning.
pub const PROPENSITY_OVERLAP_FLOOR: f64 = 0.1;

/// Confounder missingness above this fraction triggers a warning.
pub const HIGH_MISSINGNESS_FRACTION: f64 = 0.5;

/// Column missingness above this fraction becomes a reasoning-chain caveat.
pub const CAVEAT_MISSINGNESS_FRACTION: f64 = 0.3;

/// Cohorts smaller than this get a sample-size caveat in the explanation.
pub const SMALL_COHORT_SIZE: usize = 200;

/// Design-matrix condition number above which controls are flagged collinear.
pub const COLLINEARITY_CONDITION_LIMIT: f64 = 30.0;
