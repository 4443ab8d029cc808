//! Generation dispatch: one seam between the pipeline and the model backends.
//!
//! The pipeline never talks to a model client directly. It names a `Backend`
//! and the dispatcher resolves it to the configured client, runs the blocking
//! call on the blocking pool, and maps failures into the pipeline error type.
//! There is no cross-backend failover: a cloud failure on an online request
//! is reported, never silently retried against the local model.

use std::sync::Arc;

use crate::backend::{CloudModel, LocalModel};

use super::AssistantError;

/// Which generation backend a request path is bound to. Closed set: adding
/// a backend means adding a variant and a dispatch arm, not a config string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Cloud,
    Local,
}

impl Backend {
    /// Human-readable name used in availability errors.
    pub fn display_name(&self) -> &'static str {
        match self {
            Backend::Cloud => "Online model",
            Backend::Local => "Local model",
        }
    }
}

/// Holds the configured model clients and routes completion calls to them.
///
/// The cloud client is optional: without an API key the server still boots
/// and serves offline paths, while online paths fail per-request with
/// `BackendUnavailable`. The local client is always constructed (it is just
/// an HTTP client), its availability is a per-call question.
pub struct GenerationDispatcher {
    cloud: Option<Arc<dyn CloudModel>>,
    local: Arc<dyn LocalModel>,
}

impl GenerationDispatcher {
    pub fn new(cloud: Option<Arc<dyn CloudModel>>, local: Arc<dyn LocalModel>) -> Self {
        Self { cloud, local }
    }

    pub fn cloud_configured(&self) -> bool {
        self.cloud.is_some()
    }

    /// Run one completion against the named backend.
    pub async fn complete(&self, prompt: &str, backend: Backend) -> Result<String, AssistantError> {
        tracing::debug!(?backend, prompt_chars = prompt.len(), "Dispatching completion");

        match backend {
            Backend::Cloud => {
                let cloud = self.cloud_or_unavailable(backend)?;
                let prompt = prompt.to_string();
                let text = tokio::task::spawn_blocking(move || cloud.complete(&prompt))
                    .await
                    .map_err(|e| AssistantError::BackendCallFailed(e.to_string()))??;
                Ok(text)
            }
            Backend::Local => {
                let local = Arc::clone(&self.local);
                let prompt = prompt.to_string();
                let text = tokio::task::spawn_blocking(move || local.complete(&prompt))
                    .await
                    .map_err(|e| AssistantError::BackendCallFailed(e.to_string()))??;
                Ok(text)
            }
        }
    }

    /// Translate `text` into `target_lang`. Translation is a cloud capability;
    /// offline paths skip it entirely rather than calling this.
    pub async fn translate(
        &self,
        text: &str,
        target_lang: &str,
    ) -> Result<String, AssistantError> {
        let cloud = self.cloud_or_unavailable(Backend::Cloud)?;
        let text = text.to_string();
        let lang = target_lang.to_string();
        let translated = tokio::task::spawn_blocking(move || cloud.translate(&text, &lang))
            .await
            .map_err(|e| AssistantError::BackendCallFailed(e.to_string()))??;
        Ok(translated)
    }

    fn cloud_or_unavailable(&self, backend: Backend) -> Result<Arc<dyn CloudModel>, AssistantError> {
        self.cloud
            .as_ref()
            .map(Arc::clone)
            .ok_or(AssistantError::BackendUnavailable(backend.display_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockCloudModel, MockLocalModel};

    fn dispatcher_with_cloud() -> GenerationDispatcher {
        GenerationDispatcher::new(
            Some(Arc::new(MockCloudModel::translating(
                "Apply neem oil spray.",
                "What is the remedy for blast?",
            ))),
            Arc::new(MockLocalModel::new("Use resistant varieties.")),
        )
    }

    #[tokio::test]
    async fn cloud_completion_uses_cloud_client() {
        let dispatcher = dispatcher_with_cloud();
        let answer = dispatcher.complete("prompt", Backend::Cloud).await.unwrap();
        assert_eq!(answer, "Apply neem oil spray.");
    }

    #[tokio::test]
    async fn local_completion_uses_local_client() {
        let dispatcher = dispatcher_with_cloud();
        let answer = dispatcher.complete("prompt", Backend::Local).await.unwrap();
        assert_eq!(answer, "Use resistant varieties.");
    }

    #[tokio::test]
    async fn missing_cloud_client_is_unavailable_not_failover() {
        let dispatcher =
            GenerationDispatcher::new(None, Arc::new(MockLocalModel::new("offline answer")));

        let err = dispatcher.complete("prompt", Backend::Cloud).await.unwrap_err();
        assert!(matches!(err, AssistantError::BackendUnavailable(_)));

        // Local path still works with no cloud client configured.
        let answer = dispatcher.complete("prompt", Backend::Local).await.unwrap();
        assert_eq!(answer, "offline answer");
    }

    #[tokio::test]
    async fn cloud_call_failure_maps_to_backend_call_failed() {
        let dispatcher = GenerationDispatcher::new(
            Some(Arc::new(MockCloudModel::failing("Gemini"))),
            Arc::new(MockLocalModel::new("unused")),
        );

        let err = dispatcher.complete("prompt", Backend::Cloud).await.unwrap_err();
        assert!(matches!(err, AssistantError::BackendCallFailed(_)));
    }

    #[tokio::test]
    async fn local_call_failure_maps_to_backend_call_failed() {
        let dispatcher = GenerationDispatcher::new(
            None,
            Arc::new(MockLocalModel::failing("ollama down")),
        );

        let err = dispatcher.complete("prompt", Backend::Local).await.unwrap_err();
        assert!(matches!(err, AssistantError::BackendCallFailed(_)));
    }

    #[tokio::test]
    async fn translate_requires_cloud() {
        let dispatcher =
            GenerationDispatcher::new(None, Arc::new(MockLocalModel::new("unused")));
        let err = dispatcher.translate("வணக்கம்", "English").await.unwrap_err();
        assert!(matches!(err, AssistantError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn translate_returns_cloud_translation() {
        let dispatcher = dispatcher_with_cloud();
        let out = dispatcher.translate("நோய்", "English").await.unwrap();
        assert_eq!(out, "What is the remedy for blast?");
    }
}
