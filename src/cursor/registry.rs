//! Server-side cursors and their registry.
//!
//! A cursor parks a partially consumed stream together with the recovery
//! context transferred from the originating call. The registry serializes
//! continuation access per cursor: a continuation checks the cursor out,
//! works on it with no registry lock held, and checks it back in (or retires
//! it once drained).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use super::error::{CursorError, CursorResult};
use crate::executor::DocumentStream;
use crate::transaction::RecoveryContext;

/// A parked, resumable result stream.
///
/// The cursor owns the recovery context handed over by the call that created
/// it; dropping the cursor releases the context exactly once.
pub struct ServerCursor {
    id: u64,
    namespace: String,
    stream: Box<dyn DocumentStream>,
    recovery: RecoveryContext,
    created_at: DateTime<Utc>,
    last_used: DateTime<Utc>,
}

impl ServerCursor {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Namespace of the stream this cursor continues.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn stream_mut(&mut self) -> &mut dyn DocumentStream {
        self.stream.as_mut()
    }

    pub fn is_exhausted(&self) -> bool {
        self.stream.is_exhausted()
    }

    /// The recovery context this cursor owns.
    pub fn recovery(&self) -> &RecoveryContext {
        &self.recovery
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

enum CursorSlot {
    /// Waiting for a continuation call.
    Parked(ServerCursor),
    /// Checked out by a continuation call.
    Pinned,
}

struct RegistryInner {
    cursors: HashMap<u64, CursorSlot>,
    next_id: u64,
}

/// Process-wide registry of parked cursors.
///
/// The registry is an injectable service: clones share the same state, and
/// callers hold a handle instead of reaching for a global.
#[derive(Clone)]
pub struct CursorRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    max_open: usize,
}

impl CursorRegistry {
    pub fn new(max_open: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                cursors: HashMap::new(),
                next_id: 0,
            })),
            max_open,
        }
    }

    /// Park a stream and its recovery context, returning the cursor id.
    ///
    /// Ids are never zero, and the cursor is fully constructed before it
    /// becomes visible under the registry lock. At capacity the stream and
    /// context are dropped (released) and the registration fails.
    pub fn register(
        &self,
        namespace: String,
        stream: Box<dyn DocumentStream>,
        recovery: RecoveryContext,
    ) -> CursorResult<u64> {
        let mut inner = self.inner.lock();
        if inner.cursors.len() >= self.max_open {
            return Err(CursorError::AllocationFailed {
                open: inner.cursors.len(),
                max: self.max_open,
            });
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let now = Utc::now();
        let cursor = ServerCursor {
            id,
            namespace,
            stream,
            recovery,
            created_at: now,
            last_used: now,
        };
        inner.cursors.insert(id, CursorSlot::Parked(cursor));
        Ok(id)
    }

    /// Check a cursor out for one continuation call.
    ///
    /// The slot stays pinned until the cursor is checked back in or retired,
    /// so concurrent continuations of the same cursor are refused rather
    /// than interleaved.
    pub fn checkout(&self, id: u64) -> CursorResult<ServerCursor> {
        let mut inner = self.inner.lock();
        let slot = inner.cursors.get_mut(&id).ok_or(CursorError::NotFound(id))?;
        if matches!(slot, CursorSlot::Pinned) {
            return Err(CursorError::InUse(id));
        }
        match std::mem::replace(slot, CursorSlot::Pinned) {
            CursorSlot::Parked(cursor) => Ok(cursor),
            CursorSlot::Pinned => Err(CursorError::InUse(id)),
        }
    }

    /// Return a checked-out cursor to the registry.
    pub fn checkin(&self, mut cursor: ServerCursor) {
        cursor.last_used = Utc::now();
        let mut inner = self.inner.lock();
        inner.cursors.insert(cursor.id, CursorSlot::Parked(cursor));
    }

    /// Remove the slot of a checked-out cursor that has been drained.
    pub fn retire(&self, id: u64) {
        self.inner.lock().cursors.remove(&id);
    }

    /// Kill a parked cursor, releasing its resources.
    ///
    /// Returns false for unknown or checked-out cursors, so repeated kills
    /// are harmless.
    pub fn kill(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        match inner.cursors.get(&id) {
            Some(CursorSlot::Parked(_)) => {
                inner.cursors.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Drop parked cursors idle for longer than `ttl`.
    ///
    /// Checked-out cursors are never reaped. Returns how many were removed.
    pub fn reap_expired(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut inner = self.inner.lock();
        let before = inner.cursors.len();
        inner.cursors.retain(|_, slot| match slot {
            CursorSlot::Parked(cursor) => now.signed_duration_since(cursor.last_used) <= ttl,
            CursorSlot::Pinned => true,
        });
        before - inner.cursors.len()
    }

    /// Number of cursors currently registered, parked or checked out.
    pub fn open_cursors(&self) -> usize {
        self.inner.lock().cursors.len()
    }

    /// Whether the registry currently knows this id.
    pub fn contains(&self, id: u64) -> bool {
        self.inner.lock().cursors.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{Document, MaterializedStream};
    use crate::transaction::RecoveryUnits;
    use serde_json::json;

    fn doc(name: &str) -> Document {
        let mut d = Document::new();
        d.insert("name".to_string(), json!(name));
        d
    }

    fn park(registry: &CursorRegistry, units: &RecoveryUnits, docs: Vec<Document>) -> u64 {
        registry
            .register(
                "app.$cmd.listCollections".to_string(),
                Box::new(MaterializedStream::new(docs)),
                units.issue(0),
            )
            .unwrap()
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let registry = CursorRegistry::new(8);
        let units = RecoveryUnits::new();

        let first = park(&registry, &units, vec![doc("a")]);
        let second = park(&registry, &units, vec![doc("b")]);
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(registry.open_cursors(), 2);
    }

    #[test]
    fn test_capacity_limit() {
        let registry = CursorRegistry::new(1);
        let units = RecoveryUnits::new();

        park(&registry, &units, vec![doc("a")]);
        let result = registry.register(
            "app.$cmd.listCollections".to_string(),
            Box::new(MaterializedStream::new(vec![doc("b")])),
            units.issue(0),
        );
        assert!(matches!(
            result,
            Err(CursorError::AllocationFailed { open: 1, max: 1 })
        ));

        // the refused registration released its recovery context
        assert_eq!(units.active_count(), 1);
    }

    #[test]
    fn test_checkout_serializes_access() {
        let registry = CursorRegistry::new(8);
        let units = RecoveryUnits::new();
        let id = park(&registry, &units, vec![doc("a"), doc("b")]);

        let cursor = registry.checkout(id).unwrap();
        assert!(matches!(registry.checkout(id), Err(CursorError::InUse(_))));

        registry.checkin(cursor);
        let cursor = registry.checkout(id).unwrap();
        assert_eq!(cursor.id(), id);
        assert_eq!(cursor.namespace(), "app.$cmd.listCollections");
    }

    #[test]
    fn test_checkout_unknown_cursor() {
        let registry = CursorRegistry::new(8);
        assert!(matches!(registry.checkout(42), Err(CursorError::NotFound(42))));
    }

    #[test]
    fn test_retire_releases_resources() {
        let registry = CursorRegistry::new(8);
        let units = RecoveryUnits::new();
        let id = park(&registry, &units, vec![doc("a")]);
        assert_eq!(units.active_count(), 1);

        let cursor = registry.checkout(id).unwrap();
        registry.retire(id);
        drop(cursor);

        assert!(!registry.contains(id));
        assert_eq!(units.active_count(), 0);
    }

    #[test]
    fn test_kill_is_idempotent() {
        let registry = CursorRegistry::new(8);
        let units = RecoveryUnits::new();
        let id = park(&registry, &units, vec![doc("a")]);

        assert!(registry.kill(id));
        assert!(!registry.kill(id));
        assert_eq!(units.active_count(), 0);
    }

    #[test]
    fn test_kill_refuses_pinned_cursor() {
        let registry = CursorRegistry::new(8);
        let units = RecoveryUnits::new();
        let id = park(&registry, &units, vec![doc("a")]);

        let cursor = registry.checkout(id).unwrap();
        assert!(!registry.kill(id));
        registry.checkin(cursor);
        assert!(registry.kill(id));
    }

    #[test]
    fn test_reap_expired() {
        let registry = CursorRegistry::new(8);
        let units = RecoveryUnits::new();
        park(&registry, &units, vec![doc("a")]);
        park(&registry, &units, vec![doc("b")]);

        // nothing is old enough yet
        assert_eq!(registry.reap_expired(Duration::minutes(10)), 0);

        // with a negative ttl everything parked has expired
        assert_eq!(registry.reap_expired(Duration::milliseconds(-1)), 2);
        assert_eq!(registry.open_cursors(), 0);
        assert_eq!(units.active_count(), 0);
    }

    #[test]
    fn test_reap_skips_pinned_cursors() {
        let registry = CursorRegistry::new(8);
        let units = RecoveryUnits::new();
        let id = park(&registry, &units, vec![doc("a")]);

        let cursor = registry.checkout(id).unwrap();
        assert_eq!(registry.reap_expired(Duration::milliseconds(-1)), 0);
        registry.checkin(cursor);
        assert_eq!(registry.reap_expired(Duration::milliseconds(-1)), 1);
    }
}
