//! Document streams for command execution.
//!
//! Streams implement the pull model shared by lazy query plans and eagerly
//! computed results: downstream batching and cursor code sees one interface
//! either way.

use serde_json::{Map, Value};

use super::error::ExecuteResult;

/// A key-value result document.
pub type Document = Map<String, Value>;

/// Pull-based stream of result documents.
pub trait DocumentStream: Send {
    /// The next document, or `None` once the stream is drained.
    ///
    /// A drained stream keeps returning `None`.
    fn next_doc(&mut self) -> ExecuteResult<Option<Document>>;

    /// True once every document has been handed out.
    fn is_exhausted(&self) -> bool;
}

/// A fully computed result set behind the stream interface.
///
/// Each document is returned exactly once, in the order the set was built.
/// Pulling never blocks and never touches anything outside the set.
pub struct MaterializedStream {
    documents: Vec<Document>,
    position: usize,
}

impl MaterializedStream {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            position: 0,
        }
    }

    /// Documents not yet handed out.
    pub fn remaining(&self) -> usize {
        self.documents.len() - self.position
    }
}

impl DocumentStream for MaterializedStream {
    fn next_doc(&mut self) -> ExecuteResult<Option<Document>> {
        if self.position < self.documents.len() {
            let doc = self.documents[self.position].clone();
            self.position += 1;
            Ok(Some(doc))
        } else {
            Ok(None)
        }
    }

    fn is_exhausted(&self) -> bool {
        self.position >= self.documents.len()
    }
}
