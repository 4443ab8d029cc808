pub mod context;
pub mod diagnosis;
pub mod dispatch;
pub mod orchestrator;
pub mod prompt;
pub mod route;
pub mod types;

use thiserror::Error;

use crate::backend::BackendError;
use crate::knowledge::KnowledgeError;

/// Failure taxonomy for the orchestration layer.
///
/// Every variant is contained before the transport boundary: handlers map
/// errors into an apology envelope with `source = "Error"` and never let one
/// propagate upward.
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Malformed question or undecodable image. Detected early, before any
    /// retrieval or generation is attempted.
    #[error("Invalid input: {0}")]
    InputError(String),

    /// A required model or service was never initialized at startup.
    #[error("{0} is not available")]
    BackendUnavailable(&'static str),

    /// A call to cloud/local generation or the classifier raised or timed
    /// out. Aborts the remainder of the request's pipeline; never retried
    /// in this layer.
    #[error("Backend call failed: {0}")]
    BackendCallFailed(String),

    /// Live enrichment (weather) could not be fetched in time. Soft failure,
    /// absorbed at context assembly and never surfaced as a request error.
    #[error("Enrichment data unavailable")]
    EnrichmentUnavailable,
}

impl From<BackendError> for AssistantError {
    fn from(err: BackendError) -> Self {
        AssistantError::BackendCallFailed(err.to_string())
    }
}

impl From<KnowledgeError> for AssistantError {
    fn from(err: KnowledgeError) -> Self {
        AssistantError::BackendCallFailed(err.to_string())
    }
}
