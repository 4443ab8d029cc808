//! Context assembly: merges retrieved chunks and live enrichment into one
//! prompt-ready string.
//!
//! Priority order is fixed: live weather first, then collections in routing
//! order (price before knowledge). Failure policy is per-collection: a store
//! error or empty result drops that section silently; an all-empty assembly
//! yields the empty string and generation receives only the raw question.

use std::sync::Arc;

use crate::knowledge::KnowledgeStore;
use crate::pipeline::types::{Collection, RoutingDecision, WeatherReading};

/// Per-collection result sizes. Fixed per call-site, not globally uniform.
#[derive(Debug, Clone, Copy)]
pub struct TopKByCollection {
    pub knowledge: usize,
    pub price: usize,
}

impl TopKByCollection {
    fn for_collection(&self, collection: Collection) -> usize {
        match collection {
            Collection::Knowledge => self.knowledge,
            Collection::Price => self.price,
        }
    }
}

/// Online text queries: 5 price chunks, 3 knowledge chunks.
pub const ONLINE_TOP_K: TopKByCollection = TopKByCollection {
    knowledge: 3,
    price: 5,
};

/// Offline text queries lean harder on the knowledge base.
pub const OFFLINE_TOP_K: TopKByCollection = TopKByCollection {
    knowledge: 4,
    price: 5,
};

/// Diagnosis remedy lookup: knowledge collection only, 3 chunks.
pub const REMEDY_TOP_K: TopKByCollection = TopKByCollection {
    knowledge: 3,
    price: 5,
};

/// Queries the routed collections and concatenates their chunks under
/// labeled section headers.
pub struct ContextAssembler {
    store: Arc<dyn KnowledgeStore>,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }

    /// Assemble the context string for one request.
    ///
    /// Deterministic: identical inputs against an unchanged store produce
    /// byte-identical output. Each store query runs on the blocking pool;
    /// the collections are consulted sequentially, so a request holds at
    /// most one outstanding blocking call.
    pub async fn assemble(
        &self,
        decision: &RoutingDecision,
        query_text: &str,
        top_k: TopKByCollection,
        weather: Option<WeatherReading>,
    ) -> String {
        let mut sections = Vec::with_capacity(decision.collections.len() + 1);

        // Live, time-sensitive data takes priority over static retrieved text.
        if let Some(reading) = weather {
            sections.push(format_weather_section(&reading));
        }

        for &collection in &decision.collections {
            let store = Arc::clone(&self.store);
            let text = query_text.to_string();
            let k = top_k.for_collection(collection);

            let result = tokio::task::spawn_blocking(move || store.query(collection, &text, k))
                .await;

            match result {
                Ok(Ok(chunks)) if !chunks.is_empty() => {
                    sections.push(format_collection_section(collection, &chunks));
                }
                Ok(Ok(_)) => {
                    tracing::debug!(%collection, "No chunks retrieved, omitting section");
                }
                Ok(Err(e)) => {
                    tracing::warn!(%collection, error = %e, "Retrieval failed, omitting section");
                }
                Err(e) => {
                    tracing::warn!(%collection, error = %e, "Retrieval task failed, omitting section");
                }
            }
        }

        sections.join("\n\n")
    }
}

fn format_weather_section(reading: &WeatherReading) -> String {
    format!(
        "CURRENT WEATHER DATA:\n- Temperature: {}°C\n- Humidity: {}%",
        reading.temperature_c, reading.humidity_pct
    )
}

fn format_collection_section(
    collection: Collection,
    chunks: &[crate::pipeline::types::KnowledgeChunk],
) -> String {
    let body = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("--- {} ---\n{}", collection.section_header(), body)
}
