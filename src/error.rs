//! Error taxonomy shared by every pipeline stage.
//!
//! Each stage documents which variants it can return. No stage recovers
//! locally; errors travel up to the runner, which tags them with the last
//! stage reached.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the training pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A configuration value or generator parameter is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Input arrays are misaligned or not diverse enough for the operation.
    #[error("data shape error: {0}")]
    DataShape(String),

    /// A model or scaler could not be fitted.
    #[error("fit error: {0}")]
    Fit(String),

    /// Filesystem failure while reading or writing an artifact.
    #[error("I/O error at {}", path.display())]
    Io {
        /// File or directory involved in the failed operation
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidArgument(_) => "InvalidArgument",
            PipelineError::DataShape(_) => "DataShapeError",
            PipelineError::Fit(_) => "FitError",
            PipelineError::Io { .. } => "IOError",
            PipelineError::Serialization(_) => "SerializationError",
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, PipelineError>;
