//! Error types for the rewear library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`RewearError`] enum. Handlers and the CLI map these variants onto
//! HTTP statuses and exit codes; the library itself never panics on
//! bad input.

use std::io;

use thiserror::Error;

/// The main error type for rewear operations.
#[derive(Error, Debug)]
pub enum RewearError {
    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dataset-related errors (missing columns, empty files, etc.)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// A categorical value outside an encoder's fitted vocabulary.
    ///
    /// The message format is part of the HTTP contract: prediction
    /// handlers surface it verbatim in 400 responses.
    #[error("Unknown {field} label: {value}")]
    UnknownLabel { field: String, value: String },

    /// Prediction was requested before the model was fitted.
    #[error("Model not trained")]
    ModelNotTrained,

    /// Too few rows to fit a model.
    #[error("Training data insufficient: need at least {min_samples} samples, got {actual}")]
    InsufficientTrainingData { min_samples: usize, actual: usize },

    /// A feature vector whose arity does not match the trained schema.
    #[error("Invalid feature vector: expected {expected} features, got {actual}")]
    InvalidFeatureVector { expected: usize, actual: usize },

    /// A persisted artifact file that does not exist.
    #[error("Artifact missing: {path}")]
    ArtifactMissing { path: String },

    /// A persisted artifact file that exists but cannot be decoded.
    #[error("Artifact corrupt: {path}: {detail}")]
    ArtifactCorrupt { path: String, detail: String },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`RewearError`].
pub type Result<T> = std::result::Result<T, RewearError>;

impl RewearError {
    /// Create a new dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        RewearError::Dataset(msg.into())
    }

    /// Create a new unknown-label error for the given field.
    pub fn unknown_label<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        RewearError::UnknownLabel {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a new invalid-argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        RewearError::InvalidArgument(msg.into())
    }
}
