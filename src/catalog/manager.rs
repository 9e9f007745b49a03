//! In-memory collection catalog.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use super::types::{CollectionName, CollectionOptions, InvalidNameError};

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("collection already exists: {0}")]
    CollectionExists(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),
}

/// Metadata stored for one collection.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    /// Options the collection was created with.
    pub options: CollectionOptions,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// All collections of one database, keyed by name.
#[derive(Debug, Default)]
struct DatabaseCatalog {
    collections: BTreeMap<String, CollectionEntry>,
}

impl DatabaseCatalog {
    /// A fresh database always carries its bookkeeping collection.
    fn seeded() -> Self {
        let mut db = Self::default();
        db.collections.insert(
            CollectionName::bookkeeping().into_string(),
            CollectionEntry {
                options: CollectionOptions::default(),
                created_at: Utc::now(),
            },
        );
        db
    }
}

#[derive(Default)]
struct CatalogInner {
    databases: BTreeMap<String, DatabaseCatalog>,
    version: u64,
}

/// The catalog manages collection metadata for every database.
///
/// Clones share the same state, so the catalog can be handed to the executor
/// and the database handle alike. Reads never fail; a database that was never
/// created simply has no collections.
#[derive(Clone, Default)]
pub struct CatalogManager {
    inner: Arc<RwLock<CatalogInner>>,
}

impl CatalogManager {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection, implicitly creating its database.
    pub fn create_collection(
        &self,
        database: &str,
        name: &CollectionName,
        options: CollectionOptions,
    ) -> CatalogResult<()> {
        let mut inner = self.inner.write();
        let db = inner
            .databases
            .entry(database.to_string())
            .or_insert_with(DatabaseCatalog::seeded);

        if db.collections.contains_key(name.as_str()) {
            return Err(CatalogError::CollectionExists(namespace(database, name.as_str())));
        }

        db.collections.insert(
            name.as_str().to_string(),
            CollectionEntry {
                options,
                created_at: Utc::now(),
            },
        );
        inner.version += 1;
        Ok(())
    }

    /// Drop a collection.
    pub fn drop_collection(&self, database: &str, name: &CollectionName) -> CatalogResult<()> {
        let mut inner = self.inner.write();
        let db = inner
            .databases
            .get_mut(database)
            .ok_or_else(|| CatalogError::CollectionNotFound(namespace(database, name.as_str())))?;

        if db.collections.remove(name.as_str()).is_none() {
            return Err(CatalogError::CollectionNotFound(namespace(database, name.as_str())));
        }
        inner.version += 1;
        Ok(())
    }

    /// Enumerate a database's collections as `(name, options)` pairs.
    ///
    /// The listing is ordered by name and includes internal bookkeeping
    /// collections; callers decide what to expose. A database that was never
    /// created yields an empty listing.
    pub fn enumerate(&self, database: &str) -> Vec<(String, CollectionOptions)> {
        let inner = self.inner.read();
        match inner.databases.get(database) {
            Some(db) => db
                .collections
                .iter()
                .map(|(name, entry)| (name.clone(), entry.options.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Check if a collection exists.
    pub fn collection_exists(&self, database: &str, name: &str) -> bool {
        let inner = self.inner.read();
        inner
            .databases
            .get(database)
            .map(|db| db.collections.contains_key(name))
            .unwrap_or(false)
    }

    /// Names of all databases known to the catalog.
    pub fn database_names(&self) -> Vec<String> {
        self.inner.read().databases.keys().cloned().collect()
    }

    /// Number of user collections across all databases, excluding internal
    /// bookkeeping.
    pub fn collection_count(&self) -> usize {
        let inner = self.inner.read();
        inner
            .databases
            .values()
            .flat_map(|db| db.collections.keys())
            .filter(|name| !name.starts_with(CollectionName::RESERVED_PREFIX))
            .count()
    }

    /// Current catalog version, bumped on every mutation.
    ///
    /// Recovery contexts record the version they were issued against as a
    /// snapshot marker.
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }
}

fn namespace(database: &str, collection: &str) -> String {
    format!("{}.{}", database, collection)
}
