//! Service registry: every external dependency the pipeline needs, resolved
//! once at bootstrap and shared behind trait objects.
//!
//! Bootstrap policy mirrors the failure taxonomy. The retrieval service is
//! load-bearing and a missing collection is fatal. The cloud backend and the
//! disease classifier are optional capabilities: when absent the server still
//! boots and the affected request paths answer with the error envelope.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::backend::gemini::GeminiClient;
use crate::backend::ollama::OllamaClient;
use crate::classifier::CropClassifier;
use crate::config::{self, Settings};
use crate::knowledge::http::HttpKnowledgeStore;
use crate::knowledge::{KnowledgeError, KnowledgeStore};
use crate::pipeline::dispatch::GenerationDispatcher;
use crate::pipeline::types::Collection;
use crate::weather::{EnrichmentProvider, OpenMeteoProvider};

/// Timeout for a single Gemini call (translation or generation).
const GEMINI_TIMEOUT_SECS: u64 = 60;
/// Timeout for a single Ollama call. Generous: small local models on CPU.
const OLLAMA_TIMEOUT_SECS: u64 = 300;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Retrieval service unavailable: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Could not create staging directory: {0}")]
    Staging(#[from] std::io::Error),
}

/// Shared handles to every external service, built once at startup.
pub struct ServiceRegistry {
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub weather: Arc<dyn EnrichmentProvider>,
    pub classifier: Option<Arc<dyn CropClassifier>>,
    pub dispatcher: GenerationDispatcher,
    pub staging_dir: PathBuf,
}

impl ServiceRegistry {
    /// Resolve all services from settings. Fatal only when the retrieval
    /// service or a configured collection is missing, or staging cannot be
    /// created.
    pub fn bootstrap(settings: &Settings) -> Result<Self, BootstrapError> {
        let knowledge = HttpKnowledgeStore::connect(
            &settings.retrieval_url,
            &[
                (Collection::Knowledge, &settings.knowledge_collection),
                (Collection::Price, &settings.price_collection),
            ],
        )?;

        let cloud = match &settings.gemini_api_key {
            Some(key) => {
                tracing::info!(model = %settings.gemini_model, "Cloud backend configured");
                Some(Arc::new(GeminiClient::new(
                    key,
                    &settings.gemini_model,
                    GEMINI_TIMEOUT_SECS,
                )) as Arc<dyn crate::backend::CloudModel>)
            }
            None => {
                tracing::warn!("GOOGLE_API_KEY not set, online requests will be rejected");
                None
            }
        };

        let ollama = OllamaClient::new(
            &settings.ollama_url,
            &settings.ollama_model,
            OLLAMA_TIMEOUT_SECS,
        );
        match ollama.is_model_available() {
            Ok(true) => tracing::info!(model = %ollama.model(), "Local backend ready"),
            Ok(false) => {
                tracing::warn!(model = %ollama.model(), "Model not pulled on Ollama instance")
            }
            Err(e) => tracing::warn!(error = %e, "Ollama not reachable at bootstrap"),
        }

        let classifier = load_classifier();
        let staging_dir = config::staging_dir();
        fs::create_dir_all(&staging_dir)?;

        Ok(Self {
            knowledge: Arc::new(knowledge),
            weather: Arc::new(OpenMeteoProvider::new()),
            classifier,
            dispatcher: GenerationDispatcher::new(cloud, Arc::new(ollama)),
            staging_dir,
        })
    }
}

#[cfg(feature = "onnx-classifier")]
fn load_classifier() -> Option<Arc<dyn CropClassifier>> {
    let model_path = config::models_dir().join("paddy_classifier.onnx");
    match crate::classifier::OnnxClassifier::load(&model_path) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(e) => {
            tracing::warn!(
                path = %model_path.display(),
                error = %e,
                "Disease classifier not loaded, image diagnosis disabled"
            );
            None
        }
    }
}

#[cfg(not(feature = "onnx-classifier"))]
fn load_classifier() -> Option<Arc<dyn CropClassifier>> {
    tracing::warn!("Built without the onnx-classifier feature, image diagnosis disabled");
    None
}
