use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the sprint metrics engine.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The upstream data source failed or yielded nothing.
    #[error("Dataset unavailable: {0}")]
    DataUnavailable(String),

    /// A sprint or task record is missing a field or carries an invalid value.
    #[error("Malformed record at {location}: {reason}")]
    MalformedRecord { location: String, reason: String },

    /// A metric produced a NaN or infinite value and cannot be published.
    #[error("Metric {metric} produced a non-finite value")]
    NonFiniteValue { metric: String },

    /// A dataset file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MetricsError {
    /// Build a [`MetricsError::MalformedRecord`] from anything printable.
    pub fn malformed(location: impl Into<String>, reason: impl ToString) -> Self {
        MetricsError::MalformedRecord {
            location: location.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the metrics crates.
pub type Result<T> = std::result::Result<T, MetricsError>;
