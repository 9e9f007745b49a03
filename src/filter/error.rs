//! Filter compilation errors.

use thiserror::Error;

/// Result type for filter compilation.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors raised while compiling a filter document.
#[derive(Debug, Clone, Error)]
pub enum FilterError {
    #[error("filter must be a document")]
    NotADocument,

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("{op} expects {expected}")]
    InvalidOperand { op: String, expected: &'static str },

    #[error("empty field path")]
    EmptyFieldPath,
}
