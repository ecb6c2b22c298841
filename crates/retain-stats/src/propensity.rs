//! Propensity-score matching: logistic propensity model, caliper-bounded
//! nearest-neighbour matching, ATT with a paired t-test.

use chrono::Utc;
use retain_core::config::StatsConfig;
use retain_core::constants;
use retain_core::ids;
use retain_core::models::{Confidence, EffectDirection, TestMethod, TestResult};
use retain_data::Dataset;
use tracing::debug;

use crate::logit;
use crate::ols::t_p_value;
use crate::prepare::{self, is_binary, std_dev};

/// Caliper width as a multiple of the propensity-logit SD.
const CALIPER_LOGIT_SD_FACTOR: f64 = 0.2;

/// Balance above this mean SMD is flagged as potentially biased.
const BALANCE_WARNING_LIMIT: f64 = 0.2;

/// Estimate the average treatment effect on the treated by matching.
pub fn propensity_matching(
    config: &StatsConfig,
    dataset: &Dataset,
    hypothesis_id: &str,
    treatment: &str,
    outcome: &str,
    confounders: &[String],
) -> TestResult {
    let method = TestMethod::PropensityMatching;
    let Some(prepared) = prepare::prepare(dataset, treatment, outcome, confounders) else {
        return TestResult::skipped(hypothesis_id, method, "treatment or outcome column missing");
    };
    let mut warnings = prepared.warnings.clone();

    if !is_binary(&prepared.treatment) {
        warnings.push("treatment is not binary; matching not applicable".to_string());
        return with_warnings(TestResult::skipped(hypothesis_id, method, ""), warnings);
    }

    let treated_idx: Vec<usize> = indices_where(&prepared.treatment, 1.0);
    let control_idx: Vec<usize> = indices_where(&prepared.treatment, 0.0);
    if treated_idx.len() < constants::MIN_ROWS_PER_CLASS
        || control_idx.len() < constants::MIN_ROWS_PER_CLASS
    {
        warnings.push(format!(
            "fewer than {} matched pairs achievable ({} treated, {} control)",
            constants::MIN_MATCHED_PAIRS,
            treated_idx.len(),
            control_idx.len()
        ));
        return with_warnings(TestResult::skipped(hypothesis_id, method, ""), warnings);
    }

    // Standardized controls keep the IRLS fit well-conditioned.
    let standardized = standardize(&prepared.controls);
    let propensity = match logit::fit(&standardized, &prepared.treatment) {
        Ok(fit) => standardized
            .iter()
            .map(|row| fit.predict(row))
            .collect::<Vec<f64>>(),
        Err(e) => {
            warnings.push(format!("propensity model failed: {e}"));
            return with_warnings(TestResult::skipped(hypothesis_id, method, ""), warnings);
        }
    };

    // Common-support check on the raw propensity scale.
    let treated_ps: Vec<f64> = treated_idx.iter().map(|&i| propensity[i]).collect();
    let control_ps: Vec<f64> = control_idx.iter().map(|&i| propensity[i]).collect();
    let overlap = range_overlap(&treated_ps, &control_ps);
    if overlap < constants::PROPENSITY_OVERLAP_FLOOR {
        warnings.push(format!(
            "propensity overlap {overlap:.2} below {:.1}; common support is weak",
            constants::PROPENSITY_OVERLAP_FLOOR
        ));
    }

    // Match on the logit scale within a caliper.
    let logits: Vec<f64> = propensity
        .iter()
        .map(|p| (p.clamp(1e-6, 1.0 - 1e-6) / (1.0 - p.clamp(1e-6, 1.0 - 1e-6))).ln())
        .collect();
    let caliper = CALIPER_LOGIT_SD_FACTOR * std_dev(&logits);

    let mut differences = Vec::new();
    let mut matched_controls = Vec::new();
    for &i in &treated_idx {
        let mut candidates: Vec<(f64, usize)> = control_idx
            .iter()
            .map(|&j| ((logits[i] - logits[j]).abs(), j))
            .filter(|(d, _)| *d <= caliper)
            .collect();
        if candidates.is_empty() {
            continue;
        }
        candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(config.matching_neighbors);
        let matched_mean = candidates
            .iter()
            .map(|(_, j)| prepared.outcome[*j])
            .sum::<f64>()
            / candidates.len() as f64;
        differences.push(prepared.outcome[i] - matched_mean);
        matched_controls.push(matched_mean);
    }

    if differences.is_empty() {
        warnings.push("no treated units matched within the caliper".to_string());
        return with_warnings(TestResult::skipped(hypothesis_id, method, ""), warnings);
    }
    let pairs = differences.len();
    if pairs < constants::MIN_MATCHED_PAIRS {
        warnings.push(format!(
            "fewer than {} matched pairs ({pairs}); estimates are fragile",
            constants::MIN_MATCHED_PAIRS
        ));
    }

    let att = differences.iter().sum::<f64>() / pairs as f64;
    let se = std_dev(&differences) / (pairs as f64).sqrt();
    let (p_value, is_significant) = if se > 0.0 {
        let p = t_p_value(att / se, (pairs - 1) as f64);
        (p, p < config.significance_level)
    } else {
        (1.0, false)
    };

    let treated_outcomes: Vec<f64> = treated_idx
        .iter()
        .map(|&i| prepared.outcome[i])
        .collect();
    let pooled_sd = ((std_dev(&treated_outcomes).powi(2) + std_dev(&matched_controls).powi(2))
        / 2.0)
        .sqrt();
    let effect_size = if pooled_sd > 0.0 {
        att.abs() / pooled_sd
    } else {
        0.0
    };

    let balance = balance_score(&prepared, &treated_idx, &control_idx);
    if balance > BALANCE_WARNING_LIMIT {
        warnings.push(format!(
            "covariate balance {balance:.2} above {BALANCE_WARNING_LIMIT}; results may be biased"
        ));
    }

    debug!(
        hypothesis_id,
        pairs, att, p_value, "propensity matching complete"
    );

    TestResult {
        id: ids::next_id("test"),
        hypothesis_id: hypothesis_id.to_string(),
        method,
        is_significant,
        p_value: Some(p_value),
        effect_size: Some(effect_size),
        effect_direction: EffectDirection::from_estimate(att),
        point_estimate: Some(att),
        confidence_interval: Some((att - 1.96 * se, att + 1.96 * se)),
        standard_error: Some(se),
        confidence: Confidence::from_effect_size(effect_size),
        sample_size: Some(pairs),
        balance_score: Some(balance),
        warnings,
        created_at: Utc::now(),
    }
}

fn indices_where(values: &[f64], level: f64) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == level)
        .map(|(i, _)| i)
        .collect()
}

fn standardize(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = rows.len();
    let k = rows.first().map(Vec::len).unwrap_or(0);
    if n == 0 || k == 0 {
        return rows.to_vec();
    }
    let mut means = vec![0.0; k];
    for row in rows {
        for (j, value) in row.iter().enumerate() {
            means[j] += value;
        }
    }
    for mean in &mut means {
        *mean /= n as f64;
    }
    let mut sds = vec![0.0; k];
    for row in rows {
        for (j, value) in row.iter().enumerate() {
            sds[j] += (value - means[j]).powi(2);
        }
    }
    for sd in &mut sds {
        *sd = (*sd / (n as f64 - 1.0).max(1.0)).sqrt();
        if *sd <= 0.0 {
            *sd = 1.0;
        }
    }
    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(j, value)| (value - means[j]) / sds[j])
                .collect()
        })
        .collect()
}

/// Mean standardized mean difference across confounders, treated vs control.
fn balance_score(
    prepared: &prepare::PreparedMatrix,
    treated_idx: &[usize],
    control_idx: &[usize],
) -> f64 {
    let k = prepared.control_names.len();
    if k == 0 {
        return 0.0;
    }
    let mut smds = Vec::with_capacity(k);
    for j in 0..k {
        let treated: Vec<f64> = treated_idx.iter().map(|&i| prepared.controls[i][j]).collect();
        let control: Vec<f64> = control_idx.iter().map(|&i| prepared.controls[i][j]).collect();
        let mean_diff = (mean(&treated) - mean(&control)).abs();
        let pooled = ((std_dev(&treated).powi(2) + std_dev(&control).powi(2)) / 2.0).sqrt();
        if pooled > 0.0 {
            smds.push(mean_diff / pooled);
        }
    }
    if smds.is_empty() {
        1.0
    } else {
        smds.iter().sum::<f64>() / smds.len() as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn range_overlap(a: &[f64], b: &[f64]) -> f64 {
    let (min_a, max_a) = min_max(a);
    let (min_b, max_b) = min_max(b);
    (max_a.min(max_b) - min_a.max(min_b)).max(0.0)
}

fn min_max(values: &[f64]) -> (f64, f64) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

fn with_warnings(mut result: TestResult, warnings: Vec<String>) -> TestResult {
    result.warnings.retain(|w| !w.is_empty());
    result.warnings.extend(warnings);
    result
}
