//! Command execution errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::cursor::CursorError;
use crate::filter::FilterError;
use crate::transaction::TransactionError;

/// Result type for command execution.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Command execution errors.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The supplied filter document does not compile.
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("cursor error: {0}")]
    Cursor(#[from] CursorError),

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
