//! Error handling for the panel pipeline.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Specialized error type for flow extraction and panel construction
#[derive(Debug, Error)]
pub enum PanelError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// IO error tied to a specific path
    #[error("IO error for {path}: {message}")]
    PathError {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// Error decoding a delimited source
    #[error("Delimited source error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error reading or writing Parquet data
    #[error("Parquet error: {0}")]
    ParquetError(#[from] ParquetError),

    /// Error building Arrow arrays or batches
    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    /// Error in the run configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error parsing a JSON configuration file
    #[error("Configuration parse error: {0}")]
    ConfigParseError(#[from] serde_json::Error),

    /// Stored data does not match the fixed schema
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// The inclusion source is missing
    #[error("Inclusion source not found: {}", .0.display())]
    MissingInclusionSet(PathBuf),

    /// The inclusion source produced no eligible entities
    #[error("Inclusion source {} contains no eligible entities", .0.display())]
    EmptyInclusionSet(PathBuf),

    /// None of the configured sources exist
    #[error("No readable source files among {0} configured")]
    NoEligibleSources(usize),

    /// Nothing survived filtering and classification
    #[error("No flow data survived filtering ({rows_read} rows read, {rows_matched} matched)")]
    EmptyAggregate { rows_read: u64, rows_matched: u64 },
}

impl PanelError {
    /// Create a path-scoped IO error without an underlying source
    pub fn path_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PathError {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a path-scoped IO error wrapping the original error
    pub fn path_error_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: io::Error,
    ) -> Self {
        Self::PathError {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError(message.into())
    }
}

/// Result type for panel operations
pub type Result<T> = std::result::Result<T, PanelError>;
