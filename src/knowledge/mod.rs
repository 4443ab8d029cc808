pub mod http;
pub mod memory;

use thiserror::Error;

use crate::pipeline::types::{Collection, KnowledgeChunk};

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Retrieval service connection failed: {0}")]
    Connection(String),

    #[error("Retrieval service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Configured collection does not exist: {0}")]
    UnknownCollection(String),
}

/// Read-only similarity search over named document collections.
///
/// Implementations are shared, immutable-after-init resources; `query` is a
/// potentially blocking call and must be run off the async scheduler (the
/// context assembler dispatches it via `spawn_blocking`).
pub trait KnowledgeStore: Send + Sync {
    /// Return the `top_k` chunks closest to `text` in `collection`,
    /// most-relevant first.
    fn query(
        &self,
        collection: Collection,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeChunk>, KnowledgeError>;
}
