//! Request orchestration: the four handler entry points.
//!
//! Each handler is infallible by contract. Internally the pipeline propagates
//! `AssistantError` with `?`; the handler is the containment boundary that
//! maps any failure into an apology envelope tagged `Error`. No failover
//! between backends happens here: an online request that loses its cloud
//! backend fails as an online request.

use std::sync::Arc;

use crate::registry::ServiceRegistry;

use super::context::{ContextAssembler, OFFLINE_TOP_K, ONLINE_TOP_K};
use super::diagnosis;
use super::dispatch::Backend;
use super::route;
use super::types::{source_tags, Query, ResponseEnvelope, RoutingDecision, WeatherReading};
use super::{prompt, AssistantError};

const ONLINE_APOLOGY: &str = "An error occurred with the online model.";
const OFFLINE_APOLOGY: &str = "An error occurred with the local model.";
const DIAGNOSIS_APOLOGY: &str = "An error occurred during diagnosis.";
const NO_CLASSIFIER_APOLOGY: &str = "Local model not loaded.";

/// Canonical working language for retrieval.
const CANONICAL_LANG: &str = "English";

/// The orchestration facade the HTTP surface talks to.
pub struct AssistantService {
    registry: Arc<ServiceRegistry>,
    assembler: ContextAssembler,
}

impl AssistantService {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        let assembler = ContextAssembler::new(Arc::clone(&registry.knowledge));
        Self { registry, assembler }
    }

    /// Online text query: translate, route, retrieve, generate with the
    /// cloud backend, answer in the farmer's language.
    pub async fn text_query_online(&self, query: Query) -> ResponseEnvelope {
        match self.run_online_text(&query).await {
            Ok(answer) => ResponseEnvelope::new(answer, source_tags::ONLINE_TEXT),
            Err(e) => {
                tracing::error!(error = %e, "Online text query failed");
                ResponseEnvelope::error(ONLINE_APOLOGY)
            }
        }
    }

    /// Offline text query: no translation step, local generation only.
    pub async fn text_query_offline(&self, query: Query) -> ResponseEnvelope {
        match self.run_offline_text(&query).await {
            Ok(answer) => ResponseEnvelope::new(answer, source_tags::OFFLINE_TEXT),
            Err(e) => {
                tracing::error!(error = %e, "Offline text query failed");
                ResponseEnvelope::error(OFFLINE_APOLOGY)
            }
        }
    }

    /// Image diagnosis with a cloud-generated treatment plan.
    pub async fn diagnose_online(&self, image_bytes: &[u8]) -> ResponseEnvelope {
        match self.run_diagnosis(image_bytes, Backend::Cloud).await {
            Ok(answer) => ResponseEnvelope::new(answer, source_tags::ONLINE_DIAGNOSIS),
            Err(AssistantError::BackendUnavailable("Disease classifier")) => {
                ResponseEnvelope::error(NO_CLASSIFIER_APOLOGY)
            }
            Err(e) => {
                tracing::error!(error = %e, "Online diagnosis failed");
                ResponseEnvelope::error(DIAGNOSIS_APOLOGY)
            }
        }
    }

    /// Fully offline image diagnosis.
    pub async fn diagnose_offline(&self, image_bytes: &[u8]) -> ResponseEnvelope {
        match self.run_diagnosis(image_bytes, Backend::Local).await {
            Ok(answer) => ResponseEnvelope::new(answer, source_tags::OFFLINE_DIAGNOSIS),
            Err(AssistantError::BackendUnavailable("Disease classifier")) => {
                ResponseEnvelope::error(NO_CLASSIFIER_APOLOGY)
            }
            Err(e) => {
                tracing::error!(error = %e, "Offline diagnosis failed");
                ResponseEnvelope::error(OFFLINE_APOLOGY)
            }
        }
    }

    async fn run_online_text(&self, query: &Query) -> Result<String, AssistantError> {
        // Routing operates on the canonical language; the prompt keeps the
        // farmer's original wording for the model to answer against.
        let canonical = self
            .registry
            .dispatcher
            .translate(&query.text, CANONICAL_LANG)
            .await?;
        tracing::debug!(canonical = %canonical, "Query translated for retrieval");

        let decision = route::route(&canonical, query);
        let weather = self.enrich(query, &decision).await;
        let context = self
            .assembler
            .assemble(&decision, &canonical, ONLINE_TOP_K, weather)
            .await;

        let prompt = prompt::build_online_prompt(&query.text, &context);
        self.registry.dispatcher.complete(&prompt, Backend::Cloud).await
    }

    async fn run_offline_text(&self, query: &Query) -> Result<String, AssistantError> {
        let decision = route::route(&query.text, query);
        let weather = self.enrich(query, &decision).await;
        let context = self
            .assembler
            .assemble(&decision, &query.text, OFFLINE_TOP_K, weather)
            .await;

        let prompt = prompt::build_offline_prompt(&query.text, &context);
        self.registry.dispatcher.complete(&prompt, Backend::Local).await
    }

    async fn run_diagnosis(
        &self,
        image_bytes: &[u8],
        backend: Backend,
    ) -> Result<String, AssistantError> {
        diagnosis::diagnose(
            self.registry.classifier.as_ref().map(Arc::clone),
            &self.assembler,
            &self.registry.dispatcher,
            &self.registry.staging_dir,
            image_bytes,
            backend,
        )
        .await
    }

    /// Best-effort weather lookup. Absorbs every failure into `None`; a
    /// request never fails because enrichment did.
    async fn enrich(&self, query: &Query, decision: &RoutingDecision) -> Option<WeatherReading> {
        if !decision.needs_enrichment {
            return None;
        }
        let location = query.location?;
        let provider = Arc::clone(&self.registry.weather);

        let result = tokio::task::spawn_blocking(move || {
            provider.lookup(location.latitude, location.longitude)
        })
        .await;

        match result {
            Ok(Ok(reading)) => Some(reading),
            Ok(Err(_)) | Err(_) => {
                tracing::debug!("Enrichment unavailable, continuing without weather");
                None
            }
        }
    }
}
