//! Column-oriented tabular view shared read-only across all stages.

use std::collections::HashMap;

use retain_core::errors::{DataError, RetainResult};
use serde::{Deserialize, Serialize};

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// A named column of cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Cell::Number).collect(),
        }
    }

    pub fn text(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(|v| Cell::Text(v.into())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_fraction(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let nulls = self.values.iter().filter(|c| c.is_null()).count();
        nulls as f64 / self.values.len() as f64
    }

    /// Numeric view: `Number` cells pass through, everything else is None.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Cell::as_number).collect()
    }

    /// Non-null numeric values only.
    pub fn present_numeric(&self) -> Vec<f64> {
        self.values.iter().filter_map(Cell::as_number).collect()
    }

    /// Whether every non-null value is numeric 0 or 1.
    pub fn is_binary(&self) -> bool {
        let mut saw_value = false;
        for cell in &self.values {
            match cell {
                Cell::Null => {}
                Cell::Number(v) if *v == 0.0 || *v == 1.0 => saw_value = true,
                _ => return false,
            }
        }
        saw_value
    }

    /// Count of distinct non-null values (textual rendering for numerics).
    pub fn distinct_count(&self) -> usize {
        let mut seen: Vec<String> = Vec::new();
        for cell in &self.values {
            let key = match cell {
                Cell::Null => continue,
                Cell::Number(v) => format!("{v}"),
                Cell::Text(s) => s.clone(),
            };
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen.len()
    }

    /// Mean of non-null numeric values.
    pub fn mean(&self) -> Option<f64> {
        let present = self.present_numeric();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        }
    }
}

/// Rows × named columns, with an optional ordered time index.
///
/// Shared read-only across all stages; no stage mutates it. Built in
/// memory by the caller (CSV parsing lives outside the engine), so it
/// carries no serde impls of its own.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    time_column: Option<String>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from equal-length columns.
    pub fn from_columns(columns: Vec<Column>) -> RetainResult<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        for column in &columns {
            if column.len() != row_count {
                return Err(DataError::LengthMismatch {
                    column: column.name.clone(),
                    expected: row_count,
                    actual: column.len(),
                }
                .into());
            }
        }
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Ok(Self {
            columns,
            index,
            time_column: None,
            row_count,
        })
    }

    /// Declare the ordered time index column (rows already sorted by it).
    pub fn with_time_column(mut self, name: impl Into<String>) -> Self {
        self.time_column = Some(name.into());
        self
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Numeric view of a column, None when absent.
    pub fn numeric(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name).map(Column::numeric_values)
    }

    /// 0/1 indicator for equality with a categorical level.
    pub fn indicator(&self, name: &str, level: &str) -> Option<Vec<Option<f64>>> {
        self.column(name).map(|column| {
            column
                .values
                .iter()
                .map(|cell| match cell {
                    Cell::Null => None,
                    Cell::Text(s) => Some(if s == level { 1.0 } else { 0.0 }),
                    Cell::Number(_) => None,
                })
                .collect()
        })
    }

    /// Whether an ordered time index is declared and present.
    pub fn has_time_index(&self) -> bool {
        self.time_column
            .as_deref()
            .map(|name| self.has_column(name))
            .unwrap_or(false)
    }

    pub fn time_column(&self) -> Option<&str> {
        self.time_column.as_deref()
    }
}
