//! Response batch assembly under byte and count limits.

use super::error::ExecuteResult;
use super::stream::{Document, DocumentStream};

/// Default ceiling on the serialized size of one response batch.
pub const DEFAULT_MAX_BATCH_BYTES: usize = 4 * 1024 * 1024;

/// Limits governing how much one batch may carry.
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    /// Ceiling on accumulated serialized bytes. Only consulted once the
    /// batch holds at least one document, so an oversized document still
    /// makes progress instead of wedging the stream.
    pub max_bytes: usize,

    /// Optional ceiling on the document count. Zero is allowed and yields an
    /// empty batch while leaving the stream untouched.
    pub batch_size: Option<usize>,
}

impl BatchLimits {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            batch_size: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCH_BYTES)
    }
}

/// One page of results pulled from a stream.
#[derive(Debug)]
pub struct Batch {
    /// Documents in stream order.
    pub documents: Vec<Document>,
    /// Accumulated serialized size of `documents`.
    pub bytes: usize,
    /// Whether the stream still holds documents after this batch.
    pub has_more: bool,
}

/// Pull one batch from `stream` under `limits`.
///
/// Limits decide where a page ends, never whether a document is returned at
/// all: a document that does not fit this batch stays in the stream for the
/// next one.
pub fn build_batch(stream: &mut dyn DocumentStream, limits: &BatchLimits) -> ExecuteResult<Batch> {
    let mut documents = Vec::new();
    let mut bytes = 0;

    loop {
        if let Some(limit) = limits.batch_size {
            if documents.len() >= limit {
                break;
            }
        }
        if !documents.is_empty() && bytes >= limits.max_bytes {
            break;
        }

        match stream.next_doc()? {
            Some(doc) => {
                bytes += serde_json::to_vec(&doc)?.len();
                documents.push(doc);
            }
            None => break,
        }
    }

    Ok(Batch {
        documents,
        bytes,
        has_more: !stream.is_exhausted(),
    })
}
