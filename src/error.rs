//! Error types for power analysis.

use thiserror::Error;

/// Result type alias for power-analysis operations.
pub type Result<T> = std::result::Result<T, PowerError>;

/// Errors raised while validating inputs to a power analysis.
///
/// Every variant is detected before any numeric work starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PowerError {
    /// Neither a budget nor a standard-error tolerance was supplied.
    #[error("at least one of `budget` and `se_tol` must be provided")]
    MissingParameter,

    /// An input array has more than one column.
    #[error("{name} must be a 1D array, got {columns} columns")]
    InvalidShape {
        /// Which input was rejected.
        name: &'static str,
        /// Number of columns found.
        columns: usize,
    },

    /// An input contains NaN or an infinity.
    #[error("{name} contains a non-finite value at index {index}")]
    NonFiniteValue {
        /// Which input was rejected.
        name: &'static str,
        /// Position of the first offending value.
        index: usize,
    },

    /// Gradient column count does not match the inverse Hessian.
    #[error("dimension mismatch between the gradient and the inverse Hessian: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Size of the inverse Hessian.
        expected: usize,
        /// Columns of the offending matrix.
        actual: usize,
    },

    /// Two arrays that must be paired row-by-row have different lengths.
    #[error("{name} has {actual} samples, expected {expected}")]
    SampleCountMismatch {
        /// Which input was rejected.
        name: &'static str,
        /// Required sample count.
        expected: usize,
        /// Sample count found.
        actual: usize,
    },

    /// A weight vector does not have one weight per sample.
    #[error("{name} has {actual} weights for {expected} samples")]
    WeightLength {
        /// Which weight vector was rejected.
        name: &'static str,
        /// Number of samples.
        expected: usize,
        /// Number of weights.
        actual: usize,
    },

    /// A weight vector contains a negative or non-finite entry.
    #[error("{name} must contain finite, non-negative weights")]
    InvalidWeights {
        /// Which weight vector was rejected.
        name: &'static str,
    },

    /// Too few samples to estimate a variance or a mean.
    #[error("{name} needs at least {required} samples, got {actual}")]
    InsufficientSamples {
        /// Which input was rejected.
        name: &'static str,
        /// Minimum sample count.
        required: usize,
        /// Sample count found.
        actual: usize,
    },

    /// A cost, budget or tolerance is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
