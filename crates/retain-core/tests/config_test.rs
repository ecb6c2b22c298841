use retain_core::config::{ReasoningConfig, RetainConfig, StatsConfig};

#[test]
fn defaults_match_documented_values() {
    let config = RetainConfig::default();
    assert_eq!(config.stats.significance_level, 0.05);
    assert_eq!(config.stats.matching_neighbors, 5);
    assert_eq!(config.stats.test_budget_secs, 10);
    assert_eq!(config.reasoning.llm_timeout_secs, 30);
    assert_eq!(config.reasoning.retry_budget, 2);
    assert_eq!(config.reasoning.min_hypotheses, 3);
    assert_eq!(config.reasoning.max_hypotheses, 10);
    assert_eq!(config.reasoning.correlation_scan_threshold, 0.3);
}

#[test]
fn partial_config_deserializes_over_defaults() {
    let stats: StatsConfig = serde_json::from_str(r#"{"significance_level": 0.01}"#).unwrap();
    assert_eq!(stats.significance_level, 0.01);
    assert_eq!(stats.matching_neighbors, 5);

    let reasoning: ReasoningConfig = serde_json::from_str(r#"{"retry_budget": 5}"#).unwrap();
    assert_eq!(reasoning.retry_budget, 5);
    assert_eq!(reasoning.llm_timeout_secs, 30);
}

#[test]
fn full_config_round_trips() {
    let config = RetainConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let back: RetainConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.stats.significance_level, config.stats.significance_level);
    assert_eq!(back.reasoning.max_hypotheses, config.reasoning.max_hypotheses);
}
