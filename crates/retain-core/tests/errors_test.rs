use retain_core::errors::*;

#[test]
fn missing_outcome_carries_column() {
    let err = DataError::MissingOutcome {
        column: "churn_30d".into(),
    };
    assert!(err.to_string().contains("churn_30d"));
}

#[test]
fn insufficient_hypotheses_mentions_the_floor() {
    let err = ReasoningError::InsufficientHypotheses {
        valid: 1,
        generated: 4,
    };
    let msg = err.to_string();
    assert!(msg.contains("fewer than 2"), "got: {msg}");
    assert!(msg.contains('1'));
    assert!(msg.contains('4'));
}

#[test]
fn schema_violation_carries_attempts_and_detail() {
    let err = LlmError::SchemaViolation {
        attempts: 3,
        detail: "hypotheses must be an array".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains('3'));
    assert!(msg.contains("array"));
}

// --- From impls ---

#[test]
fn data_error_converts_to_retain_error() {
    let err: RetainError = DataError::EmptyDataset.into();
    assert!(matches!(err, RetainError::DataError(_)));
}

#[test]
fn llm_error_converts_to_retain_error() {
    let err: RetainError = LlmError::Timeout { budget_secs: 30 }.into();
    assert!(matches!(err, RetainError::LlmError(_)));
}

#[test]
fn stats_error_converts_to_retain_error() {
    let err: RetainError = StatsError::DimensionMismatch {
        expected: 3,
        actual: 2,
    }
    .into();
    assert!(matches!(err, RetainError::StatsError(_)));
}
