/// Data-quality errors raised before or during profiling.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("outcome column '{column}' not present in dataset")]
    MissingOutcome { column: String },

    #[error("outcome column '{column}' is degenerate: only one unique value")]
    DegenerateOutcome { column: String },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("column '{column}' not present in dataset")]
    MissingColumn { column: String },

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}
