/// Internal statistical-kernel errors.
///
/// Data-dependent conditions (small samples, collinearity, missing support)
/// never surface here — they become `TestResult` warnings. These variants
/// indicate programming errors in the caller.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("design matrix is singular: {detail}")]
    SingularMatrix { detail: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
