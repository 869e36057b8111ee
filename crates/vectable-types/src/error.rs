use thiserror::Error;

/// Errors raised when a record, filter, or schema violates the declared schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("vector length {actual} does not match expected length {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("column '{0}' does not exist")]
    UnknownColumn(String),

    #[error("column '{0}' is required")]
    MissingRequired(String),

    #[error("column '{column}' is declared {expected} but was given {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("column '{0}' is reserved for the embedding and cannot be used here")]
    ReservedColumn(String),

    #[error("column '{0}' is declared more than once")]
    DuplicateColumn(String),

    #[error("index '{index}' references unknown column '{column}'")]
    UnknownIndexColumn { index: String, column: String },

    #[error("vector length must be positive")]
    EmptyDimension,
}

/// Errors decoding persisted data into domain values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("embedding payload of {0} bytes is not a multiple of 8")]
    InvalidLength(usize),

    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("column '{column}' declared {expected} but stored {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },
}

/// Errors from similarity scoring.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("cannot compare vectors of length {left} and {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("cosine similarity is undefined for a zero-magnitude vector")]
    ZeroMagnitude,
}

/// Top-level error returned by store operations.
///
/// `Storage` carries the backend's message verbatim; the store never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("computation error: {0}")]
    Computation(#[from] ComputationError),

    #[error("storage error: {0}")]
    Storage(String),
}
