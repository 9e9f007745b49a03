//! High-level Database API.
//!
//! This module provides the user-facing handle that wires the catalog, the
//! cursor registry, and the command executor together.

mod api;

pub use api::{Database, DatabaseConfig, DatabaseError, DatabaseResult, DatabaseStats};
