//! Uzhavan, a farmer Q&A assistant over hybrid retrieval.
//!
//! The crate orchestrates four request paths (online/offline text queries,
//! online/offline image diagnosis) over a retrieval service, live weather
//! enrichment, a cloud generation backend and a local one. Every request
//! answers a single `ResponseEnvelope`; failures are contained at the
//! handler boundary.

pub mod api;
pub mod backend;
pub mod classifier;
pub mod config;
pub mod knowledge;
pub mod pipeline;
pub mod registry;
pub mod weather;

pub use pipeline::orchestrator::AssistantService;
pub use pipeline::types::{Query, ResponseEnvelope};
pub use registry::ServiceRegistry;
