use serde::{Deserialize, Serialize};

/// A farmer's question, optionally tagged with where it was asked from.
///
/// Immutable once received; scoped to a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    #[serde(alias = "question")]
    pub text: String,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Named handle to a knowledge store collection.
///
/// The set of collections is fixed configuration, not discovered at request
/// time; bootstrap fails if a configured collection does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// General rice cultivation knowledge base.
    Knowledge,
    /// Daily market price database.
    Price,
}

impl Collection {
    /// Section header used when this collection's chunks are concatenated
    /// into the assembled context.
    pub fn section_header(&self) -> &'static str {
        match self {
            Collection::Knowledge => "RICE KNOWLEDGE BASE",
            Collection::Price => "LATEST MARKET PRICES",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collection::Knowledge => write!(f, "knowledge"),
            Collection::Price => write!(f, "price"),
        }
    }
}

/// Where a text query's context should come from.
///
/// `collections` is ordered: it is the order sections are concatenated, so
/// price results (when routed) precede general knowledge results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub collections: Vec<Collection>,
    pub needs_enrichment: bool,
}

/// A retrieved text chunk, similarity-ranked by the knowledge store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeChunk {
    pub text: String,
    /// Source tag from the chunk's metadata (e.g. the ingested document).
    pub source: String,
}

/// Live weather reading from the enrichment provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// One classifier forward pass over an uploaded crop photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// One of the fixed closed label set (see `classifier::CLASS_NAMES`).
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

/// The sole externally visible output shape.
///
/// Invariant: every code path, success or failure, produces exactly one
/// envelope; no exception crosses the layer boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub answer: String,
    /// Tag identifying which backend/path produced the answer.
    pub source: String,
}

impl ResponseEnvelope {
    pub fn new(answer: impl Into<String>, source: &str) -> Self {
        Self {
            answer: answer.into(),
            source: source.to_string(),
        }
    }

    /// The uniform failure envelope: a human-readable apology, tagged `Error`.
    pub fn error(apology: &str) -> Self {
        Self {
            answer: apology.to_string(),
            source: source_tags::ERROR.to_string(),
        }
    }
}

/// Provenance strings for the `source` field of the envelope.
pub mod source_tags {
    /// Online text query: cloud generation over hybrid retrieved context.
    pub const ONLINE_TEXT: &str = "Gemini (Hybrid RAG)";
    /// Offline text query: local generation only.
    pub const OFFLINE_TEXT: &str = "Ollama (Offline)";
    /// Image diagnosis with cloud generation of the treatment plan.
    pub const ONLINE_DIAGNOSIS: &str = "Local Model + Gemini";
    /// Fully offline image diagnosis.
    pub const OFFLINE_DIAGNOSIS: &str = "Local Model + Phi-3";
    /// Any failure path.
    pub const ERROR: &str = "Error";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_deserializes_question_alias() {
        let q: Query = serde_json::from_str(r#"{"question": "நெல் விலை என்ன?"}"#).unwrap();
        assert_eq!(q.text, "நெல் விலை என்ன?");
        assert!(q.location.is_none());
    }

    #[test]
    fn query_deserializes_location() {
        let q: Query = serde_json::from_str(
            r#"{"text": "rain today?", "location": {"latitude": 11.0, "longitude": 78.5}}"#,
        )
        .unwrap();
        let loc = q.location.unwrap();
        assert_eq!(loc.latitude, 11.0);
        assert_eq!(loc.longitude, 78.5);
    }

    #[test]
    fn error_envelope_is_tagged_error() {
        let env = ResponseEnvelope::error("An error occurred.");
        assert_eq!(env.source, "Error");
        assert_eq!(env.answer, "An error occurred.");
    }

    #[test]
    fn envelope_serializes_answer_and_source() {
        let env = ResponseEnvelope::new("வணக்கம்", source_tags::ONLINE_TEXT);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["answer"], "வணக்கம்");
        assert_eq!(json["source"], "Gemini (Hybrid RAG)");
    }

    #[test]
    fn collection_section_headers_match_prompt_labels() {
        assert_eq!(Collection::Price.section_header(), "LATEST MARKET PRICES");
        assert_eq!(Collection::Knowledge.section_header(), "RICE KNOWLEDGE BASE");
    }
}
