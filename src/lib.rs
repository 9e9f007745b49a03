//! DocBase - an embeddable document-database core built around resumable
//! command cursors.
//!
//! The centerpiece is the `listCollections`-style administrative flow:
//! enumerate a database's collections, filter them with a match document,
//! and page the result back through the same cursor protocol a live query
//! would use, parking a server-side cursor whenever one batch cannot carry
//! everything.
//!
//! # Example
//!
//! ```
//! use docbase::catalog::CollectionOptions;
//! use docbase::db::Database;
//! use docbase::executor::{GetMore, ListCollections};
//!
//! let db = Database::new();
//! db.create_collection("app", "users", CollectionOptions::default()).unwrap();
//! db.create_collection("app", "events", CollectionOptions::capped(1 << 20)).unwrap();
//!
//! let reply = db.list_collections(ListCollections::new("app").with_batch_size(1)).unwrap();
//! assert_eq!(reply.batch.len(), 1);
//! assert_ne!(reply.cursor_id, 0);
//!
//! let rest = db.get_more(GetMore::new(reply.cursor_id)).unwrap();
//! assert!(rest.is_final());
//! ```

pub mod catalog;
pub mod cursor;
pub mod db;
pub mod executor;
pub mod filter;
pub mod transaction;
