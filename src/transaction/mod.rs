//! Per-operation transactional resources with single-owner transfer.
//!
//! The recovery context is the resource a call hands over to a parked cursor
//! when a listing does not fit in one batch. Ownership is modeled as a slot
//! that is either held by the caller or held by the cursor, never both.

mod context;
mod error;

pub use context::{OperationContext, RecoveryContext, RecoveryUnits};
pub use error::{TransactionError, TransactionResult};
