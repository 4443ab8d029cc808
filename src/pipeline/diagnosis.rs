//! Image diagnosis pipeline.
//!
//! A strict forward walk through RECEIVED, CLASSIFIED, CONTEXT_BUILT and
//! ANSWERED; any error short-circuits to FAILED. The uploaded image is staged
//! to disk for the duration of the request and removed again on every exit
//! path, success or failure, via an RAII guard.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use uuid::Uuid;

use crate::classifier::CropClassifier;
use crate::pipeline::types::{Collection, DiagnosisResult, RoutingDecision};

use super::context::{ContextAssembler, REMEDY_TOP_K};
use super::dispatch::{Backend, GenerationDispatcher};
use super::prompt;
use super::AssistantError;

/// Staged copy of the uploaded image. Removed from disk on drop.
struct StagedImage {
    path: PathBuf,
}

impl StagedImage {
    fn stage(staging_dir: &Path, bytes: &[u8]) -> Result<Self, AssistantError> {
        let path = staging_dir.join(Uuid::new_v4().to_string());
        fs::write(&path, bytes)
            .map_err(|e| AssistantError::BackendCallFailed(format!("Image staging failed: {e}")))?;
        Ok(Self { path })
    }
}

impl Drop for StagedImage {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staged image");
        }
    }
}

/// Run one image diagnosis end to end and return the answer text.
///
/// The classifier verdict from a single forward pass is authoritative; the
/// remedy lookup always targets the knowledge collection and never enriches
/// with live data. Callers wrap the returned text (or the error) into the
/// response envelope.
pub async fn diagnose(
    classifier: Option<Arc<dyn CropClassifier>>,
    assembler: &ContextAssembler,
    dispatcher: &GenerationDispatcher,
    staging_dir: &Path,
    image_bytes: &[u8],
    backend: Backend,
) -> Result<String, AssistantError> {
    let classifier =
        classifier.ok_or(AssistantError::BackendUnavailable("Disease classifier"))?;

    let staged = StagedImage::stage(staging_dir, image_bytes)?;
    tracing::debug!(path = %staged.path.display(), bytes = image_bytes.len(), "Image received and staged");

    let image = image::load_from_memory(image_bytes)
        .map_err(|e| AssistantError::InputError(format!("Could not decode image: {e}")))?;

    let verdict = classify(Arc::clone(&classifier), image).await?;
    tracing::info!(
        label = %verdict.label,
        confidence = verdict.confidence,
        "Image classified"
    );

    let remedy_query = format!("remedy for {}", verdict.label);
    let decision = RoutingDecision {
        collections: vec![Collection::Knowledge],
        needs_enrichment: false,
    };
    let context = assembler
        .assemble(&decision, &remedy_query, REMEDY_TOP_K, None)
        .await;
    tracing::debug!(context_chars = context.len(), "Remedy context built");

    let confidence_pct = verdict.confidence * 100.0;
    let answer = match backend {
        Backend::Cloud => {
            let prompt =
                prompt::build_online_diagnosis_prompt(&verdict.label, confidence_pct, &context);
            dispatcher.complete(&prompt, backend).await?
        }
        Backend::Local => {
            let prompt = prompt::build_offline_diagnosis_prompt(&verdict.label, &context);
            let plan = dispatcher.complete(&prompt, backend).await?;
            format!(
                "**I am confident this is {} ({:.2}%).**\n\n{}",
                verdict.label, confidence_pct, plan
            )
        }
    };

    tracing::info!(?backend, "Diagnosis answered");
    drop(staged);
    Ok(answer)
}

async fn classify(
    classifier: Arc<dyn CropClassifier>,
    image: DynamicImage,
) -> Result<DiagnosisResult, AssistantError> {
    tokio::task::spawn_blocking(move || classifier.infer(&image))
        .await
        .map_err(|e| AssistantError::BackendCallFailed(e.to_string()))?
}
