use std::io;

/// Represents the different kinds of failures in the encoding, prediction and
/// training paths. Every variant is surfaced to the immediate caller.
#[derive(Debug, thiserror::Error)]
pub enum RecommenderError {
    /// The classifier or encoder artifact is missing, corrupt, or the two
    /// do not belong to the same training run
    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),
    /// An answer or vector refers to a feature slot the trained schema does not know
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    /// A raw answer value was never seen while fitting the encoder
    #[error("Unknown category '{value}' for feature '{feature}'")]
    UnknownCategory { feature: String, value: String },
    /// A code outside an encoder's range was decoded
    #[error("Invalid code {code} for '{feature}' (encoder has {len} categories)")]
    InvalidCode { feature: String, code: usize, len: usize },
    /// Training input is missing columns or too small to split
    #[error("Dataset validation error: {0}")]
    DatasetValidation(String),
    /// Invalid training parameters or inputs to the forest builder
    #[error("Training error: {0}")]
    Training(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RecommenderError>;
