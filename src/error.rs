//! Error types for the biosignal-features library.

use thiserror::Error;

/// Result type alias for feature extraction and model fitting.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while extracting features or fitting models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Column lookup or schema error.
    #[error("schema error: {0}")]
    Schema(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Frequency inference failed.
    #[error("could not infer frequency: {0}")]
    FrequencyInference(String),

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Filesystem error while writing artifacts.
    #[error("i/o error: {0}")]
    Io(String),

    /// Plot rendering or encoding error.
    #[error("plot error: {0}")]
    Plot(String),
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl<E: std::error::Error + Send + Sync + 'static>
    From<plotters::drawing::DrawingAreaErrorKind<E>> for ForecastError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ForecastError::Plot(err.to_string())
    }
}
