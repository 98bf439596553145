//! Error types for the analysis core.

use thiserror::Error;

/// Every failure an analysis operation can report.
///
/// Operations surface the first condition they hit and leave the dataset
/// store untouched.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No dataset has been ingested yet")]
    NoActiveDataset,

    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    #[error("Needs at least {required} numeric column(s), dataset has {found}")]
    InsufficientNumericColumns { required: usize, found: usize },

    #[error("Insufficient rows: {0}")]
    InsufficientRows(String),

    #[error("Target column '{0}' is not numeric")]
    TargetNotNumeric(String),

    #[error("Least-squares system is singular; features are collinear or too few rows")]
    SingularMatrix,

    #[error("Unknown chart kind: '{0}'")]
    UnknownChartKind(String),

    #[error("Missing chart parameter: '{0}'")]
    MissingParameter(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("PNG encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn ingestion(msg: impl Into<String>) -> Self {
        Self::Ingestion(msg.into())
    }

    pub fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn(name.into())
    }

    pub fn insufficient_rows(msg: impl Into<String>) -> Self {
        Self::InsufficientRows(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;
