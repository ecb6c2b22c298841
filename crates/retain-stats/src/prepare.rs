//! Row preparation shared by every test: missing-value policy and
//! control-matrix assembly.
//!
//! Rows missing the treatment or outcome are dropped; missing control
//! values are mean-imputed (majority value for binaries). Both paths
//! record warnings rather than erroring.

use retain_core::constants;
use retain_data::Dataset;

/// Analysis-ready vectors for one (treatment, outcome, controls) triple.
#[derive(Debug, Clone)]
pub struct PreparedMatrix {
    pub treatment: Vec<f64>,
    pub outcome: Vec<f64>,
    /// One predictor vector per kept row, control order matching `control_names`.
    pub controls: Vec<Vec<f64>>,
    pub control_names: Vec<String>,
    pub warnings: Vec<String>,
    pub rows_dropped: usize,
}

impl PreparedMatrix {
    pub fn n(&self) -> usize {
        self.treatment.len()
    }
}

/// Assemble the analysis matrix. Returns None when the treatment or
/// outcome column is absent or non-numeric (callers check feasibility
/// first, so this is a guard, not an error path).
pub fn prepare(
    dataset: &Dataset,
    treatment: &str,
    outcome: &str,
    controls: &[String],
) -> Option<PreparedMatrix> {
    let treatment_view = dataset.numeric(treatment)?;
    let outcome_view = dataset.numeric(outcome)?;

    let mut warnings = Vec::new();

    // Keep rows where both treatment and outcome are present.
    let kept: Vec<usize> = (0..dataset.row_count())
        .filter(|&i| treatment_view[i].is_some() && outcome_view[i].is_some())
        .collect();
    let rows_dropped = dataset.row_count() - kept.len();
    if rows_dropped > 0 {
        warnings.push(format!(
            "{rows_dropped} rows dropped for missing treatment or outcome values"
        ));
    }

    let treatment_values: Vec<f64> = kept.iter().filter_map(|&i| treatment_view[i]).collect();
    let outcome_values: Vec<f64> = kept.iter().filter_map(|&i| outcome_view[i]).collect();

    // Controls: impute missing entries, warn on heavy missingness.
    let mut control_names = Vec::new();
    let mut control_columns: Vec<Vec<f64>> = Vec::new();
    for name in controls {
        let Some(view) = dataset.numeric(name) else {
            warnings.push(format!("control '{name}' not in dataset, skipped"));
            continue;
        };
        let values: Vec<Option<f64>> = kept.iter().map(|&i| view[i]).collect();
        let present: Vec<f64> = values.iter().filter_map(|v| *v).collect();
        if present.is_empty() {
            warnings.push(format!("control '{name}' entirely missing, skipped"));
            continue;
        }
        let missing_fraction = 1.0 - present.len() as f64 / values.len().max(1) as f64;
        if missing_fraction > constants::HIGH_MISSINGNESS_FRACTION {
            warnings.push(format!(
                "confounder '{name}' missing in {:.0}% of rows",
                missing_fraction * 100.0
            ));
        }

        let is_binary = present.iter().all(|v| *v == 0.0 || *v == 1.0);
        let fill = if is_binary {
            // Majority value.
            let ones = present.iter().filter(|v| **v == 1.0).count();
            if ones * 2 >= present.len() {
                1.0
            } else {
                0.0
            }
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };
        if missing_fraction > 0.0 {
            warnings.push(format!(
                "control '{name}': {:.0}% missing values imputed",
                missing_fraction * 100.0
            ));
        }

        control_names.push(name.clone());
        control_columns.push(values.into_iter().map(|v| v.unwrap_or(fill)).collect());
    }

    // Transpose into per-row predictor vectors.
    let n = treatment_values.len();
    let controls_by_row = (0..n)
        .map(|i| control_columns.iter().map(|col| col[i]).collect())
        .collect();

    Some(PreparedMatrix {
        treatment: treatment_values,
        outcome: outcome_values,
        controls: controls_by_row,
        control_names,
        warnings,
        rows_dropped,
    })
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Whether every value is 0 or 1.
pub fn is_binary(values: &[f64]) -> bool {
    !values.is_empty() && values.iter().all(|v| *v == 0.0 || *v == 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retain_data::{Cell, Column, Dataset};

    fn dataset_with_gaps() -> Dataset {
        let mut treatment = Column::numeric("t", [1.0, 0.0, 1.0, 0.0, 1.0]);
        treatment.values[2] = Cell::Null;
        let mut control = Column::numeric("c", [2.0, 4.0, 6.0, 8.0, 10.0]);
        control.values[0] = Cell::Null;
        Dataset::from_columns(vec![
            treatment,
            Column::numeric("y", [0.0, 1.0, 0.0, 1.0, 0.0]),
            control,
        ])
        .unwrap()
    }

    #[test]
    fn rows_missing_treatment_are_dropped_with_warning() {
        let prepared = prepare(&dataset_with_gaps(), "t", "y", &["c".to_string()]).unwrap();
        assert_eq!(prepared.n(), 4);
        assert_eq!(prepared.rows_dropped, 1);
        assert!(prepared.warnings.iter().any(|w| w.contains("dropped")));
    }

    #[test]
    fn missing_controls_are_mean_imputed() {
        let prepared = prepare(&dataset_with_gaps(), "t", "y", &["c".to_string()]).unwrap();
        // Kept rows are 0,1,3,4; control present values 4,8,10 → mean 22/3.
        let imputed = prepared.controls[0][0];
        assert!((imputed - 22.0 / 3.0).abs() < 1e-9);
        assert!(prepared.warnings.iter().any(|w| w.contains("imputed")));
    }

    #[test]
    fn unknown_control_is_skipped() {
        let prepared = prepare(&dataset_with_gaps(), "t", "y", &["zz".to_string()]).unwrap();
        assert!(prepared.control_names.is_empty());
        assert!(prepared.warnings.iter().any(|w| w.contains("zz")));
    }
}
