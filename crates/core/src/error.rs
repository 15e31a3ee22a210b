//! Error types for the delivery analytics system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the delivery analytics system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required columns absent from an input file.
    #[error("Missing column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Nothing left to compute on.
    #[error("No data: {0}")]
    NoData(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a no-data error.
    pub fn no_data(msg: impl Into<String>) -> Self {
        Error::NoData(msg.into())
    }

    /// Create a missing-columns error.
    pub fn missing_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::MissingColumns(columns.into_iter().map(Into::into).collect())
    }
}
