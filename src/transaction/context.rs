//! Per-operation transactional resources.
//!
//! Every command call runs under an [`OperationContext`] that owns at most
//! one [`RecoveryContext`]. When a call parks a cursor, the context is moved
//! into the cursor and a fresh one is installed for the remainder of the
//! call, so the resource has a single owner at every point in time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ulid::Ulid;

use super::error::{TransactionError, TransactionResult};

/// Issues recovery contexts and tracks how many are live.
///
/// Clones share the same counter, so any handle can report the number of
/// contexts issued and not yet released.
#[derive(Clone, Default)]
pub struct RecoveryUnits {
    active: Arc<AtomicUsize>,
}

impl RecoveryUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a context pinned to the given catalog snapshot version.
    pub fn issue(&self, snapshot_version: u64) -> RecoveryContext {
        self.active.fetch_add(1, Ordering::Relaxed);
        RecoveryContext {
            id: Ulid::new(),
            snapshot_version,
            active: Arc::clone(&self.active),
        }
    }

    /// Number of contexts currently live.
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

/// A transactional read resource owned by exactly one scope at a time.
///
/// Dropping the context releases it. Ownership only ever moves, so release
/// happens exactly once no matter which side (caller or cursor) ends up
/// holding it.
#[derive(Debug)]
pub struct RecoveryContext {
    id: Ulid,
    snapshot_version: u64,
    active: Arc<AtomicUsize>,
}

impl RecoveryContext {
    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Catalog version this context was issued against.
    pub fn snapshot_version(&self) -> u64 {
        self.snapshot_version
    }
}

impl Drop for RecoveryContext {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Scope of one command call.
pub struct OperationContext {
    id: Ulid,
    recovery: Option<RecoveryContext>,
    started_at: DateTime<Utc>,
}

impl OperationContext {
    pub fn new(recovery: RecoveryContext) -> Self {
        Self {
            id: Ulid::new(),
            recovery: Some(recovery),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The recovery context, if this scope still holds it.
    pub fn recovery(&self) -> Option<&RecoveryContext> {
        self.recovery.as_ref()
    }

    /// Move the recovery context out of this scope.
    pub fn release_recovery(&mut self) -> TransactionResult<RecoveryContext> {
        self.recovery.take().ok_or(TransactionError::RecoveryReleased)
    }

    /// Hand this scope a replacement recovery context.
    pub fn install_recovery(&mut self, recovery: RecoveryContext) -> TransactionResult<()> {
        if self.recovery.is_some() {
            return Err(TransactionError::RecoveryHeld);
        }
        self.recovery = Some(recovery);
        Ok(())
    }
}
