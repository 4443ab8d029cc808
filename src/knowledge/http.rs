//! HTTP client for the retrieval service.
//!
//! The vector index itself is built and served by the offline ingestion
//! pipeline (a separate process); this layer only consumes its query API.
//! Collections are resolved once at connect time; a configured collection
//! that does not exist is fatal, not a per-request condition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{KnowledgeError, KnowledgeStore};
use crate::pipeline::types::{Collection, KnowledgeChunk};

/// Knowledge store backed by the retrieval service's REST API.
pub struct HttpKnowledgeStore {
    base_url: String,
    client: reqwest::blocking::Client,
    /// Collection enum → collection name on the service, validated at connect.
    collections: HashMap<Collection, String>,
}

/// Request body for POST /collections/{name}/query
#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    top_k: usize,
}

/// Response body from POST /collections/{name}/query
#[derive(Deserialize)]
struct QueryResponse {
    chunks: Vec<ChunkBody>,
}

#[derive(Deserialize)]
struct ChunkBody {
    text: String,
    #[serde(default)]
    source: String,
}

/// Response body from GET /collections
#[derive(Deserialize)]
struct CollectionsResponse {
    collections: Vec<String>,
}

impl HttpKnowledgeStore {
    /// Connect to the retrieval service and validate that every configured
    /// collection exists. Call once at bootstrap.
    pub fn connect(
        base_url: &str,
        collections: &[(Collection, &str)],
    ) -> Result<Self, KnowledgeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| KnowledgeError::Connection(e.to_string()))?;

        let store = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            collections: collections
                .iter()
                .map(|(c, name)| (*c, name.to_string()))
                .collect(),
        };

        let available = store.list_collections()?;
        for (_, name) in &store.collections {
            if !available.iter().any(|a| a == name) {
                return Err(KnowledgeError::UnknownCollection(name.clone()));
            }
            tracing::info!(collection = %name, "Connected to retrieval collection");
        }

        Ok(store)
    }

    fn list_collections(&self) -> Result<Vec<String>, KnowledgeError> {
        let url = format!("{}/collections", self.base_url);

        let response = self.client.get(&url).send().map_err(|e| {
            if e.is_connect() {
                KnowledgeError::Connection(self.base_url.clone())
            } else {
                KnowledgeError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(KnowledgeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CollectionsResponse = response
            .json()
            .map_err(|e| KnowledgeError::ResponseParsing(e.to_string()))?;

        Ok(parsed.collections)
    }
}

impl KnowledgeStore for HttpKnowledgeStore {
    fn query(
        &self,
        collection: Collection,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeChunk>, KnowledgeError> {
        let name = self
            .collections
            .get(&collection)
            .ok_or_else(|| KnowledgeError::UnknownCollection(collection.to_string()))?;

        let url = format!("{}/collections/{}/query", self.base_url, name);
        let body = QueryRequest { query: text, top_k };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                KnowledgeError::Connection(self.base_url.clone())
            } else {
                KnowledgeError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(KnowledgeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: QueryResponse = response
            .json()
            .map_err(|e| KnowledgeError::ResponseParsing(e.to_string()))?;

        Ok(parsed
            .chunks
            .into_iter()
            .map(|c| KnowledgeChunk {
                text: c.text,
                source: c.source,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_request_serializes() {
        let body = QueryRequest {
            query: "remedy for blast",
            top_k: 3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["query"], "remedy for blast");
        assert_eq!(json["top_k"], 3);
    }

    #[test]
    fn query_response_parses_chunks() {
        let raw = r#"{"chunks": [{"text": "Use tricyclazole.", "source": "tnau_guide.pdf"}]}"#;
        let parsed: QueryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.chunks.len(), 1);
        assert_eq!(parsed.chunks[0].text, "Use tricyclazole.");
        assert_eq!(parsed.chunks[0].source, "tnau_guide.pdf");
    }

    #[test]
    fn chunk_source_defaults_to_empty() {
        let raw = r#"{"chunks": [{"text": "No metadata here."}]}"#;
        let parsed: QueryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.chunks[0].source, "");
    }
}
