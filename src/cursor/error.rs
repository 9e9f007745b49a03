//! Cursor registry errors.

use thiserror::Error;

/// Result type for cursor operations.
pub type CursorResult<T> = Result<T, CursorError>;

/// Errors that can occur in the cursor registry.
#[derive(Debug, Clone, Error)]
pub enum CursorError {
    /// The registry is at capacity and cannot park another cursor.
    #[error("cannot allocate cursor: {open} of {max} already open")]
    AllocationFailed { open: usize, max: usize },

    #[error("cursor not found: {0}")]
    NotFound(u64),

    /// Another continuation currently holds the cursor.
    #[error("cursor {0} is in use")]
    InUse(u64),
}
