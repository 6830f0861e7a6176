//! Error types for engine operations

use thiserror::Error;

/// Result type for engine operations
pub type DataResult<T> = Result<T, DataError>;

/// Errors that can occur during engine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Two tables (or paired series) do not line up structurally
    #[error("shape mismatch: {0}")]
    InvalidShape(String),

    /// An expression referenced a column that does not exist
    #[error("unknown column: {0}")]
    Reference(String),

    /// An operation was set up with unusable parameters
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A column name was used twice within one table
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    /// Positional access past the end of a series or table
    #[error("index {index} out of bounds for length {length}")]
    OutOfBounds { index: usize, length: usize },

    /// A value of the wrong kind reached an operation
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Invalid operation for the data at hand
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::Reference("age".to_string());
        assert_eq!(err.to_string(), "unknown column: age");

        let err = DataError::TypeMismatch {
            expected: "Int".to_string(),
            found: "Str".to_string(),
        };
        assert_eq!(err.to_string(), "type mismatch: expected Int, found Str");

        let err = DataError::OutOfBounds {
            index: 5,
            length: 3,
        };
        assert_eq!(err.to_string(), "index 5 out of bounds for length 3");
    }
}
