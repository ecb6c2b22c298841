//! Synthetic customer datasets with known causal structure.

use retain_core::models::{Opportunity, OpportunityKind, Severity};
use retain_data::{Column, Dataset, FeatureCatalog, FeatureSpec, SemanticType};

use crate::rng::SplitMix64;

/// Honest mediated signal: late_delivery → low_onboarding_engagement →
/// churn_30d, with only a sliver of direct effect.
pub fn mediated_churn_dataset(n: usize, seed: u64) -> Dataset {
    let mut rng = SplitMix64::new(seed);
    let mut late = Vec::with_capacity(n);
    let mut low_onboarding = Vec::with_capacity(n);
    let mut churn = Vec::with_capacity(n);
    let mut tenure = Vec::with_capacity(n);
    let mut channel = Vec::with_capacity(n);

    for _ in 0..n {
        let is_late = rng.bernoulli(0.4);
        let is_low = rng.bernoulli(0.15 + 0.6 * is_late as u8 as f64);
        let churned = rng.bernoulli(0.05 + 0.05 * is_late as u8 as f64 + 0.45 * is_low as u8 as f64);
        late.push(is_late as u8 as f64);
        low_onboarding.push(is_low as u8 as f64);
        churn.push(churned as u8 as f64);
        tenure.push((rng.next_f64() * 700.0).floor());
        channel.push(match rng.next_u64() % 3 {
            0 => "Referral",
            1 => "Paid",
            _ => "Organic",
        });
    }

    Dataset::from_columns(vec![
        Column::numeric("late_delivery", late),
        Column::numeric("low_onboarding_engagement", low_onboarding),
        Column::numeric("churn_30d", churn),
        Column::numeric("tenure_days", tenure),
        Column::text("channel", channel),
    ])
    .unwrap()
}

pub fn mediated_catalog() -> FeatureCatalog {
    FeatureCatalog::new(vec![
        FeatureSpec::new("late_delivery", SemanticType::Binary)
            .with_description("first order arrived after the promised window"),
        FeatureSpec::new("low_onboarding_engagement", SemanticType::Binary)
            .with_description("completed fewer than 2 onboarding actions"),
        FeatureSpec::new("churn_30d", SemanticType::Binary),
        FeatureSpec::new("tenure_days", SemanticType::Continuous),
        FeatureSpec::new("channel", SemanticType::Categorical),
    ])
}

/// Pure confounding: driver_c raises both feature_a and churn_30d, but
/// feature_a has no effect of its own.
///
/// Built from exact cell counts so that feature_a and churn_30d are
/// independent *within* each driver_c stratum: the adjusted coefficient on
/// feature_a is exactly zero, whatever the row order.
pub fn confounded_dataset(seed: u64) -> Dataset {
    // (driver_c, feature_a, churn_30d, count). Stratum c=1: A at 70%,
    // churn at 50%, crossed exactly. Stratum c=0: A at 10%, churn at 10%.
    let cells: [(f64, f64, f64, usize); 8] = [
        (1.0, 1.0, 1.0, 140),
        (1.0, 1.0, 0.0, 140),
        (1.0, 0.0, 1.0, 60),
        (1.0, 0.0, 0.0, 60),
        (0.0, 1.0, 1.0, 4),
        (0.0, 1.0, 0.0, 36),
        (0.0, 0.0, 1.0, 36),
        (0.0, 0.0, 0.0, 324),
    ];
    let mut rows: Vec<(f64, f64, f64)> = Vec::new();
    for (c, a, y, count) in cells {
        for _ in 0..count {
            rows.push((c, a, y));
        }
    }
    let mut rng = SplitMix64::new(seed);
    rng.shuffle(&mut rows);

    // An extra column exactly crossed with churn: half the churned and half
    // the retained rows are region_west, so its raw association is zero too.
    let churned: Vec<usize> = (0..rows.len()).filter(|&i| rows[i].2 == 1.0).collect();
    let retained: Vec<usize> = (0..rows.len()).filter(|&i| rows[i].2 == 0.0).collect();
    let mut region = vec![0.0; rows.len()];
    for (position, &i) in churned.iter().enumerate() {
        region[i] = (position % 2) as f64;
    }
    for (position, &i) in retained.iter().enumerate() {
        region[i] = (position % 2) as f64;
    }

    Dataset::from_columns(vec![
        Column::numeric("driver_c", rows.iter().map(|r| r.0).collect::<Vec<_>>()),
        Column::numeric("feature_a", rows.iter().map(|r| r.1).collect::<Vec<_>>()),
        Column::numeric("churn_30d", rows.iter().map(|r| r.2).collect::<Vec<_>>()),
        Column::numeric("region_west", region),
    ])
    .unwrap()
}

pub fn confounded_catalog() -> FeatureCatalog {
    FeatureCatalog::new(vec![
        FeatureSpec::new("driver_c", SemanticType::Binary),
        FeatureSpec::new("feature_a", SemanticType::Binary),
        FeatureSpec::new("churn_30d", SemanticType::Binary),
        FeatureSpec::new("region_west", SemanticType::Binary),
    ])
}

/// Daily series where support_backlog leads churn_rate by one day.
pub fn lagged_series_dataset(n: usize, seed: u64) -> Dataset {
    let mut rng = SplitMix64::new(seed);
    let mut day = Vec::with_capacity(n);
    let mut backlog = Vec::with_capacity(n);
    let mut churn_rate = Vec::with_capacity(n);

    let mut level = 10.0;
    for t in 0..n {
        level = 0.7 * level + 3.0 * rng.next_f64();
        day.push(t as f64);
        backlog.push(level);
        let lagged = if t == 0 { level } else { backlog[t - 1] };
        churn_rate.push(0.02 * lagged + 0.002 * rng.gauss());
    }

    Dataset::from_columns(vec![
        Column::numeric("day", day),
        Column::numeric("support_backlog", backlog),
        Column::numeric("churn_rate", churn_rate),
    ])
    .unwrap()
    .with_time_column("day")
}

/// The S1-style opportunity: a churn spike in the Referral cohort.
pub fn referral_churn_opportunity() -> Opportunity {
    let mut opportunity = Opportunity::new(
        OpportunityKind::ChurnSpike,
        "Churn spike in Referral cohort",
        "churn_30d",
        0.15,
        0.32,
        600,
    );
    opportunity.description =
        "30-day churn for referral-acquired customers roughly doubled in six weeks".to_string();
    opportunity
        .affected_cohort
        .insert("channel".to_string(), "Referral".to_string());
    opportunity.severity = Severity::High;
    opportunity
}
