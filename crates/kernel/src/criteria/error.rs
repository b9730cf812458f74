//! Criteria construction errors.
//!
//! Every error here is a caller contract violation raised at construction
//! or mutation time. None of them are transient.

use thiserror::Error;

/// Errors raised while building condition items and condition sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    /// Column name contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid column name '{0}': only letters, digits and underscores are allowed")]
    InvalidColumnName(String),

    /// Operator is not in the permitted set.
    #[error("invalid operator '{0}'")]
    InvalidOperator(String),

    /// Joiner is neither AND nor OR.
    #[error("invalid joiner '{0}': expected AND or OR")]
    InvalidJoiner(String),

    /// Bad argument to a setter or a value that does not fit its operator.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The injected validator capability is missing or unusable.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result alias for criteria construction.
pub type CriteriaResult<T> = Result<T, CriteriaError>;
