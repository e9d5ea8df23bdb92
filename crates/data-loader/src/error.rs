//! Error types for the data-loader crate.
//!
//! Every variant means the bundle cannot be served: a load either produces a
//! complete `ArtifactBundle` or one of these, never something in between.

use thiserror::Error;

/// Errors that can occur while fetching, parsing or validating artifacts
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Artifact file is not present at the expected location
    #[error("Artifact {name} not found at {path}")]
    ArtifactNotFound { name: String, path: String },

    /// I/O error occurred while reading or writing an artifact
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON artifact could not be deserialized (includes missing keys)
    #[error("Malformed JSON in {file}: {source}")]
    JsonError {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// Line in a tabular artifact couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Tabular artifact lacks a required column
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// Two artifacts disagree about a dimension
    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// A field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Model or feature matrix failed its own structural checks
    #[error("Invalid model artifact: {0}")]
    Model(#[from] scorer::ScoreError),

    /// Remote artifact could not be downloaded
    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    /// Cross-artifact validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
