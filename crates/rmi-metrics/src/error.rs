use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a dataset load. No partial dataset is produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("dataset has no usable rows ({dropped_rows} rows dropped during cleaning)")]
    EmptyDataset { dropped_rows: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors scoped to a single view or context request. The bundle stays valid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("unknown restaurant: {0}")]
    UnknownRestaurant(String),

    #[error("context budget of {budget} bytes is too small; at least {required} bytes needed")]
    ContextBudgetTooSmall { budget: usize, required: usize },
}
