//! Command entry points: collection listing and cursor continuation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::batch::{build_batch, BatchLimits};
use super::error::ExecuteResult;
use super::stream::{Document, MaterializedStream};
use crate::catalog::{CatalogManager, CollectionName};
use crate::cursor::CursorRegistry;
use crate::filter::Predicate;
use crate::transaction::{OperationContext, RecoveryUnits};

/// Request to list the collections of one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCollections {
    /// Target database.
    pub database: String,

    /// Optional filter over the `{name, options}` documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,

    /// Optional ceiling on the first batch's document count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl ListCollections {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            filter: None,
            batch_size: None,
        }
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Request to continue a previously parked cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMore {
    pub cursor_id: u64,

    /// Optional ceiling on this batch's document count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
}

impl GetMore {
    pub fn new(cursor_id: u64) -> Self {
        Self {
            cursor_id,
            batch_size: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// One page of results plus the handle to fetch the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorReply {
    /// Zero when the batch drained the result set; otherwise the id to pass
    /// to a continuation call.
    pub cursor_id: u64,

    /// Namespace of the virtual cursor stream, e.g. `app.$cmd.listCollections`.
    pub namespace: String,

    /// The documents of this page, in listing order.
    pub batch: Vec<Document>,
}

impl CursorReply {
    /// True when no continuation is needed.
    pub fn is_final(&self) -> bool {
        self.cursor_id == 0
    }
}

/// Executes administrative commands against the catalog.
///
/// The executor owns handles to the shared services (catalog, cursor
/// registry, recovery units) and is itself cheap to construct from them.
pub struct CommandExecutor {
    catalog: CatalogManager,
    cursors: CursorRegistry,
    recovery_units: RecoveryUnits,
    max_batch_bytes: usize,
}

impl CommandExecutor {
    pub fn new(
        catalog: CatalogManager,
        cursors: CursorRegistry,
        recovery_units: RecoveryUnits,
        max_batch_bytes: usize,
    ) -> Self {
        Self {
            catalog,
            cursors,
            recovery_units,
            max_batch_bytes,
        }
    }

    /// Open an operation scope with a fresh recovery context.
    pub fn operation_context(&self) -> OperationContext {
        OperationContext::new(self.recovery_units.issue(self.catalog.version()))
    }

    /// List a database's collections, returning the first batch and, when
    /// the listing does not fit in one page, a parked cursor for the rest.
    ///
    /// On a non-exhaustive batch the caller's recovery context moves into
    /// the cursor and `ctx` receives a fresh one. If the registry refuses
    /// the cursor, the call fails and the computed batch is discarded rather
    /// than returned without a way to continue.
    pub fn list_collections(
        &self,
        ctx: &mut OperationContext,
        request: &ListCollections,
    ) -> ExecuteResult<CursorReply> {
        // a filter that does not compile fails the call before the catalog
        // is touched
        let predicate = match &request.filter {
            Some(filter) => Some(crate::filter::compile(filter)?),
            None => None,
        };

        let documents = self.materialize_listing(&request.database, predicate.as_ref())?;
        let mut stream = MaterializedStream::new(documents);

        let limits = BatchLimits::new(self.max_batch_bytes).with_batch_size(request.batch_size);
        let batch = build_batch(&mut stream, &limits)?;

        let namespace = format!("{}.$cmd.listCollections", request.database);
        let cursor_id = if batch.has_more {
            let recovery = ctx.release_recovery()?;
            let id = self
                .cursors
                .register(namespace.clone(), Box::new(stream), recovery)?;
            ctx.install_recovery(self.recovery_units.issue(self.catalog.version()))?;
            id
        } else {
            0
        };

        Ok(CursorReply {
            cursor_id,
            namespace,
            batch: batch.documents,
        })
    }

    /// Continue a parked cursor, retiring it once drained.
    pub fn get_more(&self, request: &GetMore) -> ExecuteResult<CursorReply> {
        let mut cursor = self.cursors.checkout(request.cursor_id)?;

        let limits = BatchLimits::new(self.max_batch_bytes).with_batch_size(request.batch_size);
        let batch = match build_batch(cursor.stream_mut(), &limits) {
            Ok(batch) => batch,
            Err(e) => {
                // a cursor that failed mid-pull cannot be resumed coherently
                self.cursors.retire(request.cursor_id);
                return Err(e);
            }
        };

        let namespace = cursor.namespace().to_string();
        let cursor_id = if batch.has_more {
            let id = cursor.id();
            self.cursors.checkin(cursor);
            id
        } else {
            self.cursors.retire(request.cursor_id);
            0
        };

        Ok(CursorReply {
            cursor_id,
            namespace,
            batch: batch.documents,
        })
    }

    /// Build the full, ordered listing for one database.
    fn materialize_listing(
        &self,
        database: &str,
        predicate: Option<&Predicate>,
    ) -> ExecuteResult<Vec<Document>> {
        let mut listing = self.catalog.enumerate(database);
        listing.sort_by(|a, b| a.0.cmp(&b.0));

        let mut documents = Vec::with_capacity(listing.len());
        for (name, options) in listing {
            // bookkeeping collections are invisible to the listing, filter
            // or no filter
            if name == CollectionName::BOOKKEEPING {
                continue;
            }

            let mut doc = Document::new();
            doc.insert("name".to_string(), Value::String(name));
            doc.insert("options".to_string(), serde_json::to_value(&options)?);

            if let Some(predicate) = predicate {
                if !predicate.matches(&doc) {
                    continue;
                }
            }
            documents.push(doc);
        }
        Ok(documents)
    }
}
