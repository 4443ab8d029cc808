//! In-memory knowledge store for testing, with word-overlap scoring.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{KnowledgeError, KnowledgeStore};
use crate::pipeline::types::{Collection, KnowledgeChunk};

/// Deterministic in-memory store: chunks are scored by the number of query
/// words they contain, ties broken by insertion order. Also records every
/// query it receives so tests can assert on what was asked.
pub struct InMemoryKnowledgeStore {
    chunks: HashMap<Collection, Vec<KnowledgeChunk>>,
    queries: Mutex<Vec<(Collection, String, usize)>>,
    /// When set, every query against this collection fails.
    failing: Option<Collection>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
            queries: Mutex::new(Vec::new()),
            failing: None,
        }
    }

    pub fn add(&mut self, collection: Collection, text: &str, source: &str) {
        self.chunks.entry(collection).or_default().push(KnowledgeChunk {
            text: text.to_string(),
            source: source.to_string(),
        });
    }

    /// Make every query against `collection` return an error.
    pub fn fail_collection(mut self, collection: Collection) -> Self {
        self.failing = Some(collection);
        self
    }

    /// Every `(collection, query_text, top_k)` seen so far.
    pub fn recorded_queries(&self) -> Vec<(Collection, String, usize)> {
        self.queries.lock().expect("query log lock").clone()
    }
}

impl Default for InMemoryKnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeStore for InMemoryKnowledgeStore {
    fn query(
        &self,
        collection: Collection,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeChunk>, KnowledgeError> {
        self.queries
            .lock()
            .expect("query log lock")
            .push((collection, text.to_string(), top_k));

        if self.failing == Some(collection) {
            return Err(KnowledgeError::Connection("simulated failure".to_string()));
        }

        let stored = match self.chunks.get(&collection) {
            Some(chunks) => chunks,
            None => return Ok(vec![]),
        };

        let query_words: Vec<String> = text
            .to_lowercase()
            .split_whitespace()
            .map(|w| w.to_string())
            .collect();

        let mut scored: Vec<(usize, &KnowledgeChunk)> = stored
            .iter()
            .map(|chunk| {
                let lower = chunk.text.to_lowercase();
                let score = query_words.iter().filter(|w| lower.contains(*w)).count();
                (score, chunk)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort keeps insertion order among equal scores, so results
        // are deterministic. The assembler's idempotence relies on this.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, chunk)| chunk.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_chunks() -> InMemoryKnowledgeStore {
        let mut store = InMemoryKnowledgeStore::new();
        store.add(
            Collection::Knowledge,
            "Blast disease is controlled with tricyclazole spray.",
            "tnau_guide.pdf",
        );
        store.add(
            Collection::Knowledge,
            "Transplant seedlings at 21 days for best tillering.",
            "tnau_guide.pdf",
        );
        store.add(
            Collection::Price,
            "Paddy (fine) price at Thanjavur market: Rs 2400 per quintal.",
            "market_price.pdf",
        );
        store
    }

    #[test]
    fn returns_only_matching_chunks() {
        let store = store_with_chunks();
        let results = store
            .query(Collection::Knowledge, "remedy for blast", 3)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("tricyclazole"));
    }

    #[test]
    fn respects_top_k() {
        let mut store = InMemoryKnowledgeStore::new();
        for i in 0..10 {
            store.add(Collection::Knowledge, &format!("paddy note {i}"), "src");
        }
        let results = store.query(Collection::Knowledge, "paddy", 4).unwrap();
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn empty_collection_returns_empty() {
        let store = InMemoryKnowledgeStore::new();
        let results = store.query(Collection::Price, "price of paddy", 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn records_queries() {
        let store = store_with_chunks();
        store.query(Collection::Price, "paddy price", 5).unwrap();
        let seen = store.recorded_queries();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (Collection::Price, "paddy price".to_string(), 5));
    }

    #[test]
    fn failing_collection_errors() {
        let store = store_with_chunks().fail_collection(Collection::Price);
        assert!(store.query(Collection::Price, "paddy price", 5).is_err());
        // Other collections are unaffected
        assert!(store.query(Collection::Knowledge, "blast", 3).is_ok());
    }
}
