//! Operation-scope errors.

use thiserror::Error;

/// Result type for operation-scope bookkeeping.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Errors that can occur while moving recovery contexts around.
#[derive(Debug, Clone, Error)]
pub enum TransactionError {
    /// The operation's recovery context was already moved out.
    #[error("operation holds no recovery context")]
    RecoveryReleased,

    /// The operation already holds a recovery context.
    #[error("operation already holds a recovery context")]
    RecoveryHeld,
}
