//! Database API - high-level interface for DocBase.

use thiserror::Error;

use crate::catalog::{
    CatalogError, CatalogManager, CollectionName, CollectionOptions, InvalidNameError,
};
use crate::cursor::CursorRegistry;
use crate::executor::{
    CommandExecutor, CursorReply, ExecuteError, GetMore, ListCollections, DEFAULT_MAX_BATCH_BYTES,
};
use crate::transaction::RecoveryUnits;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("execution error: {0}")]
    Execute(#[from] ExecuteError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),
}

/// Database configuration options.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Ceiling on the serialized size of one response batch.
    pub max_batch_bytes: usize,
    /// Maximum number of cursors parked at once.
    pub max_open_cursors: usize,
    /// Idle time after which a parked cursor may be reaped.
    pub cursor_ttl: chrono::Duration,
    /// Enable verbose logging.
    pub verbose: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
            max_open_cursors: 1024,
            cursor_ttl: chrono::Duration::minutes(10),
            verbose: false,
        }
    }
}

impl DatabaseConfig {
    /// Create a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch byte ceiling.
    pub fn max_batch_bytes(mut self, value: usize) -> Self {
        self.max_batch_bytes = value;
        self
    }

    /// Set the open-cursor ceiling.
    pub fn max_open_cursors(mut self, value: usize) -> Self {
        self.max_open_cursors = value;
        self
    }

    /// Set the parked-cursor idle TTL.
    pub fn cursor_ttl(mut self, value: chrono::Duration) -> Self {
        self.cursor_ttl = value;
        self
    }

    /// Set verbose flag.
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }
}

/// The main database handle.
pub struct Database {
    config: DatabaseConfig,
    catalog: CatalogManager,
    cursors: CursorRegistry,
    recovery_units: RecoveryUnits,
    executor: CommandExecutor,
}

impl Database {
    /// Create a database with default configuration.
    pub fn new() -> Self {
        Self::with_config(DatabaseConfig::default())
    }

    /// Create a database with custom configuration.
    pub fn with_config(config: DatabaseConfig) -> Self {
        let catalog = CatalogManager::new();
        let cursors = CursorRegistry::new(config.max_open_cursors);
        let recovery_units = RecoveryUnits::new();
        let executor = CommandExecutor::new(
            catalog.clone(),
            cursors.clone(),
            recovery_units.clone(),
            config.max_batch_bytes,
        );

        Self {
            config,
            catalog,
            cursors,
            recovery_units,
            executor,
        }
    }

    /// Create a collection, implicitly creating its database.
    pub fn create_collection(
        &self,
        database: &str,
        name: &str,
        options: CollectionOptions,
    ) -> DatabaseResult<()> {
        let name = CollectionName::new(name)?;
        self.catalog.create_collection(database, &name, options)?;
        Ok(())
    }

    /// Drop a collection.
    pub fn drop_collection(&self, database: &str, name: &str) -> DatabaseResult<()> {
        let name = CollectionName::new(name)?;
        self.catalog.drop_collection(database, &name)?;
        Ok(())
    }

    /// Check if a collection exists.
    pub fn collection_exists(&self, database: &str, name: &str) -> bool {
        self.catalog.collection_exists(database, name)
    }

    /// List a database's collections through the cursor protocol.
    ///
    /// Returns the first batch; a non-zero `cursor_id` in the reply means
    /// the rest is parked and can be fetched with [`Database::get_more`].
    pub fn list_collections(&self, request: ListCollections) -> DatabaseResult<CursorReply> {
        if self.config.verbose {
            eprintln!(
                "[listCollections] db={} filter={:?} batch_size={:?}",
                request.database, request.filter, request.batch_size
            );
        }

        let mut ctx = self.executor.operation_context();
        let reply = self.executor.list_collections(&mut ctx, &request)?;

        if self.config.verbose {
            eprintln!(
                "[listCollections] {} documents, cursor {}",
                reply.batch.len(),
                reply.cursor_id
            );
        }

        Ok(reply)
    }

    /// Fetch the next batch from a parked cursor.
    pub fn get_more(&self, request: GetMore) -> DatabaseResult<CursorReply> {
        if self.config.verbose {
            eprintln!("[getMore] cursor={}", request.cursor_id);
        }

        Ok(self.executor.get_more(&request)?)
    }

    /// Kill a parked cursor. Killing an unknown or already-dead cursor is
    /// harmless and returns false.
    pub fn kill_cursor(&self, cursor_id: u64) -> bool {
        self.cursors.kill(cursor_id)
    }

    /// Reap parked cursors idle for longer than the configured TTL.
    pub fn reap_expired_cursors(&self) -> usize {
        self.cursors.reap_expired(self.config.cursor_ttl)
    }

    /// Cursors currently parked or checked out.
    pub fn open_cursors(&self) -> usize {
        self.cursors.open_cursors()
    }

    /// Get database statistics.
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            databases: self.catalog.database_names().len(),
            collections: self.catalog.collection_count(),
            open_cursors: self.cursors.open_cursors(),
            active_recovery_contexts: self.recovery_units.active_count(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time database statistics.
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    /// Number of databases.
    pub databases: usize,
    /// User collections, excluding internal bookkeeping.
    pub collections: usize,
    /// Cursors parked or checked out.
    pub open_cursors: usize,
    /// Recovery contexts issued and not yet released.
    pub active_recovery_contexts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listed_names(reply: &CursorReply) -> Vec<String> {
        reply
            .batch
            .iter()
            .map(|d| d.get("name").unwrap().as_str().unwrap().to_string())
            .collect()
    }

    fn setup_abc() -> Database {
        let db = Database::new();
        for name in ["a", "b", "c"] {
            db.create_collection("app", name, CollectionOptions::default()).unwrap();
        }
        db
    }

    #[test]
    fn test_listing_pages_and_resumes() {
        let db = setup_abc();

        let reply = db
            .list_collections(ListCollections::new("app").with_batch_size(2))
            .unwrap();
        assert_eq!(listed_names(&reply), vec!["a", "b"]);
        assert_ne!(reply.cursor_id, 0);
        assert_eq!(db.open_cursors(), 1);

        let rest = db.get_more(GetMore::new(reply.cursor_id)).unwrap();
        assert_eq!(listed_names(&rest), vec!["c"]);
        assert!(rest.is_final());
        assert_eq!(db.open_cursors(), 0);
    }

    #[test]
    fn test_filter_selects_single_collection() {
        let db = setup_abc();

        let reply = db
            .list_collections(ListCollections::new("app").with_filter(json!({"name": {"$eq": "b"}})))
            .unwrap();
        assert_eq!(listed_names(&reply), vec!["b"]);
        assert_eq!(reply.cursor_id, 0);
    }

    #[test]
    fn test_filter_on_options() {
        let db = Database::new();
        db.create_collection("app", "plain", CollectionOptions::default()).unwrap();
        db.create_collection("app", "ring", CollectionOptions::capped(1 << 16)).unwrap();

        let reply = db
            .list_collections(ListCollections::new("app").with_filter(json!({"options.capped": true})))
            .unwrap();
        assert_eq!(listed_names(&reply), vec!["ring"]);
    }

    #[test]
    fn test_malformed_filter_is_rejected() {
        let db = setup_abc();

        let result =
            db.list_collections(ListCollections::new("app").with_filter(json!({"$bogus": 1})));
        assert!(matches!(
            result,
            Err(DatabaseError::Execute(ExecuteError::InvalidFilter(_)))
        ));
        assert_eq!(db.open_cursors(), 0);
    }

    #[test]
    fn test_batch_size_zero() {
        let db = setup_abc();

        let reply = db
            .list_collections(ListCollections::new("app").with_batch_size(0))
            .unwrap();
        assert!(reply.batch.is_empty());
        assert_ne!(reply.cursor_id, 0);

        let empty = Database::new();
        let reply = empty
            .list_collections(ListCollections::new("app").with_batch_size(0))
            .unwrap();
        assert!(reply.batch.is_empty());
        assert_eq!(reply.cursor_id, 0);
    }

    #[test]
    fn test_union_of_batches_is_exact() {
        let db = Database::new();
        let expected: Vec<String> = (0..10).map(|i| format!("coll{:02}", i)).collect();
        for name in &expected {
            db.create_collection("app", name, CollectionOptions::default()).unwrap();
        }

        let mut reply = db
            .list_collections(ListCollections::new("app").with_batch_size(4))
            .unwrap();
        let mut seen = listed_names(&reply);
        while reply.cursor_id != 0 {
            reply = db
                .get_more(GetMore::new(reply.cursor_id).with_batch_size(4))
                .unwrap();
            seen.extend(listed_names(&reply));
        }

        assert_eq!(seen, expected);
    }

    #[test]
    fn test_kill_cursor_is_idempotent() {
        let db = setup_abc();

        let reply = db
            .list_collections(ListCollections::new("app").with_batch_size(1))
            .unwrap();
        assert!(db.kill_cursor(reply.cursor_id));
        assert!(!db.kill_cursor(reply.cursor_id));

        let result = db.get_more(GetMore::new(reply.cursor_id));
        assert!(result.is_err());
    }

    #[test]
    fn test_reap_expired_cursors() {
        let db = Database::with_config(
            DatabaseConfig::new().cursor_ttl(chrono::Duration::milliseconds(-1)),
        );
        for name in ["a", "b", "c"] {
            db.create_collection("app", name, CollectionOptions::default()).unwrap();
        }

        let reply = db
            .list_collections(ListCollections::new("app").with_batch_size(1))
            .unwrap();
        assert_ne!(reply.cursor_id, 0);

        assert_eq!(db.reap_expired_cursors(), 1);
        assert_eq!(db.open_cursors(), 0);
    }

    #[test]
    fn test_recovery_accounting_across_lifecycle() {
        let db = setup_abc();
        assert_eq!(db.stats().active_recovery_contexts, 0);

        let reply = db
            .list_collections(ListCollections::new("app").with_batch_size(2))
            .unwrap();
        // the parked cursor owns the one live context
        assert_eq!(db.stats().active_recovery_contexts, 1);

        let rest = db.get_more(GetMore::new(reply.cursor_id)).unwrap();
        assert!(rest.is_final());
        assert_eq!(db.stats().active_recovery_contexts, 0);
    }

    #[test]
    fn test_stats() {
        let db = setup_abc();
        db.create_collection("crm", "leads", CollectionOptions::default()).unwrap();

        let stats = db.stats();
        assert_eq!(stats.databases, 2);
        assert_eq!(stats.collections, 4);
        assert_eq!(stats.open_cursors, 0);
    }

    #[test]
    fn test_invalid_collection_name() {
        let db = Database::new();
        let result = db.create_collection("app", "system.users", CollectionOptions::default());
        assert!(matches!(result, Err(DatabaseError::InvalidName(_))));
    }

    #[test]
    fn test_drop_collection_disappears_from_listing() {
        let db = setup_abc();
        db.drop_collection("app", "b").unwrap();

        let reply = db.list_collections(ListCollections::new("app")).unwrap();
        assert_eq!(listed_names(&reply), vec!["a", "c"]);
    }
}
