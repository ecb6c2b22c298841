//! Dataset profiling: column typing, missingness, prevalence, and
//! correlation with the outcome. Read-only input for the generator prompt
//! and the analyzer's confounder scan.

use retain_core::errors::{DataError, RetainResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{FeatureCatalog, SemanticType};
use crate::corr;
use crate::frame::{Cell, Column, Dataset};

/// Ordinal inference cutoff: integer-valued columns with at most this many
/// distinct values are treated as ordinal.
const ORDINAL_CARDINALITY_LIMIT: usize = 10;

/// Profile of a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub semantic_type: SemanticType,
    pub missingness: f64,
    /// Mean of a binary column.
    pub prevalence: Option<f64>,
    /// Distinct levels of a categorical column.
    pub cardinality: Option<usize>,
    /// Pearson correlation with the outcome (None for the outcome itself
    /// and for non-encodable categoricals).
    pub outcome_correlation: Option<f64>,
}

/// Compact profile of the whole dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProfile {
    pub outcome: String,
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
}

impl DataProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns whose missingness exceeds the given fraction.
    pub fn high_missingness(&self, threshold: f64) -> Vec<&ColumnProfile> {
        self.columns
            .iter()
            .filter(|c| c.missingness > threshold)
            .collect()
    }
}

/// Profile the dataset against the catalog.
///
/// Fails when the dataset is empty, the outcome column is absent, or the
/// outcome has a single unique value.
pub fn profile(
    dataset: &Dataset,
    catalog: &FeatureCatalog,
    outcome: &str,
) -> RetainResult<DataProfile> {
    if dataset.row_count() == 0 || dataset.columns().is_empty() {
        return Err(DataError::EmptyDataset.into());
    }
    let outcome_column = dataset.column(outcome).ok_or_else(|| DataError::MissingOutcome {
        column: outcome.to_string(),
    })?;
    if outcome_column.distinct_count() < 2 {
        return Err(DataError::DegenerateOutcome {
            column: outcome.to_string(),
        }
        .into());
    }

    let outcome_numeric = outcome_column.numeric_values();
    let mut columns = Vec::with_capacity(dataset.columns().len());
    for column in dataset.columns() {
        let semantic_type = catalog
            .get(&column.name)
            .map(|spec| spec.semantic_type)
            .unwrap_or_else(|| infer_semantic_type(column));

        let prevalence = match semantic_type {
            SemanticType::Binary => column.mean(),
            _ => None,
        };
        let cardinality = match semantic_type {
            SemanticType::Categorical => Some(column.distinct_count()),
            _ => None,
        };
        let outcome_correlation = if column.name == outcome {
            None
        } else {
            encode_numeric(column)
                .and_then(|values| corr::pearson(&values, &outcome_numeric))
        };

        columns.push(ColumnProfile {
            name: column.name.clone(),
            semantic_type,
            missingness: column.missing_fraction(),
            prevalence,
            cardinality,
            outcome_correlation,
        });
    }

    debug!(
        outcome,
        rows = dataset.row_count(),
        columns = columns.len(),
        "dataset profiled"
    );

    Ok(DataProfile {
        outcome: outcome.to_string(),
        row_count: dataset.row_count(),
        columns,
    })
}

fn infer_semantic_type(column: &Column) -> SemanticType {
    if column.is_binary() {
        return SemanticType::Binary;
    }
    let present = column.present_numeric();
    if present.is_empty() {
        return SemanticType::Categorical;
    }
    let all_integer = present.iter().all(|v| v.fract() == 0.0);
    if all_integer && column.distinct_count() <= ORDINAL_CARDINALITY_LIMIT {
        SemanticType::Ordinal
    } else {
        SemanticType::Continuous
    }
}

/// Numeric encoding for correlation: numerics pass through, categoricals
/// become a modal-level indicator.
fn encode_numeric(column: &Column) -> Option<Vec<Option<f64>>> {
    let has_text = column.values.iter().any(|c| matches!(c, Cell::Text(_)));
    if !has_text {
        return Some(column.numeric_values());
    }
    let modal = modal_level(column)?;
    Some(
        column
            .values
            .iter()
            .map(|cell| match cell {
                Cell::Null => None,
                Cell::Text(s) => Some(if *s == modal { 1.0 } else { 0.0 }),
                Cell::Number(_) => None,
            })
            .collect(),
    )
}

fn modal_level(column: &Column) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for cell in &column.values {
        if let Cell::Text(s) = cell {
            match counts.iter_mut().find(|(level, _)| level == s) {
                Some((_, n)) => *n += 1,
                None => counts.push((s.clone(), 1)),
            }
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, n)| *n)
        .map(|(level, _)| level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FeatureSpec;

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            Column::numeric("churn_30d", [0.0, 1.0, 0.0, 1.0, 1.0, 0.0]),
            Column::numeric("late_delivery", [0.0, 1.0, 0.0, 1.0, 1.0, 0.0]),
            Column::numeric("tenure_days", [10.0, 200.0, 35.0, 400.0, 91.0, 12.0]),
            Column::text(
                "channel",
                ["Referral", "Paid", "Referral", "Paid", "Organic", "Referral"],
            ),
        ])
        .unwrap()
    }

    fn catalog() -> FeatureCatalog {
        FeatureCatalog::new(vec![
            FeatureSpec::new("late_delivery", SemanticType::Binary),
            FeatureSpec::new("tenure_days", SemanticType::Continuous),
            FeatureSpec::new("channel", SemanticType::Categorical),
        ])
    }

    #[test]
    fn profile_types_and_correlations() {
        let profile = profile(&dataset(), &catalog(), "churn_30d").unwrap();
        assert_eq!(profile.row_count, 6);

        let late = profile.column("late_delivery").unwrap();
        assert_eq!(late.semantic_type, SemanticType::Binary);
        assert!((late.prevalence.unwrap() - 0.5).abs() < 1e-12);
        // Perfectly aligned with the outcome in this fixture.
        assert!((late.outcome_correlation.unwrap() - 1.0).abs() < 1e-9);

        let channel = profile.column("channel").unwrap();
        assert_eq!(channel.semantic_type, SemanticType::Categorical);
        assert_eq!(channel.cardinality, Some(3));

        let outcome = profile.column("churn_30d").unwrap();
        assert!(outcome.outcome_correlation.is_none());
    }

    #[test]
    fn missing_outcome_is_an_error() {
        let err = profile(&dataset(), &catalog(), "nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn degenerate_outcome_is_an_error() {
        let ds = Dataset::from_columns(vec![Column::numeric("flat", [1.0, 1.0, 1.0])]).unwrap();
        let err = profile(&ds, &FeatureCatalog::default(), "flat").unwrap_err();
        assert!(err.to_string().contains("degenerate"));
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let ds = Dataset::from_columns(vec![]).unwrap();
        assert!(profile(&ds, &FeatureCatalog::default(), "x").is_err());
    }
}
