//! Command execution: result materialization, batching, cursor handoff.
//!
//! The listing command computes its full result up front, then feeds it
//! through the same stream/batch/cursor machinery a lazily evaluated query
//! would use, so pagination and continuation behave identically for both.

mod batch;
mod error;
mod executor;
mod stream;

pub use batch::{build_batch, Batch, BatchLimits, DEFAULT_MAX_BATCH_BYTES};
pub use error::{ExecuteError, ExecuteResult};
pub use executor::{CommandExecutor, CursorReply, GetMore, ListCollections};
pub use stream::{Document, DocumentStream, MaterializedStream};
