//! HTTP surface: four POST endpoints, each answering exactly one
//! `ResponseEnvelope` with status 200.
//!
//! Transport-level problems (unreadable JSON, missing upload field) are
//! mapped into the same envelope shape as pipeline failures so clients only
//! ever parse one response schema.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use crate::pipeline::orchestrator::AssistantService;
use crate::pipeline::types::{Query, ResponseEnvelope};

const BAD_REQUEST_APOLOGY: &str = "The request could not be understood.";
const NO_IMAGE_APOLOGY: &str = "No image file was provided.";

/// Uploaded crop photos; generous but bounded.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn router(service: Arc<AssistantService>) -> Router {
    Router::new()
        .route("/api/text-query", post(text_query))
        .route("/api/offline-query", post(offline_query))
        .route("/api/image-diagnosis", post(image_diagnosis))
        .route("/api/offline-image-diagnosis", post(offline_image_diagnosis))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn text_query(
    State(service): State<Arc<AssistantService>>,
    query: Result<Json<Query>, JsonRejection>,
) -> Json<ResponseEnvelope> {
    match query {
        Ok(Json(query)) => Json(service.text_query_online(query).await),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected text query body");
            Json(ResponseEnvelope::error(BAD_REQUEST_APOLOGY))
        }
    }
}

async fn offline_query(
    State(service): State<Arc<AssistantService>>,
    query: Result<Json<Query>, JsonRejection>,
) -> Json<ResponseEnvelope> {
    match query {
        Ok(Json(query)) => Json(service.text_query_offline(query).await),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected offline query body");
            Json(ResponseEnvelope::error(BAD_REQUEST_APOLOGY))
        }
    }
}

async fn image_diagnosis(
    State(service): State<Arc<AssistantService>>,
    multipart: Multipart,
) -> Json<ResponseEnvelope> {
    match read_image_field(multipart).await {
        Some(bytes) => Json(service.diagnose_online(&bytes).await),
        None => Json(ResponseEnvelope::error(NO_IMAGE_APOLOGY)),
    }
}

async fn offline_image_diagnosis(
    State(service): State<Arc<AssistantService>>,
    multipart: Multipart,
) -> Json<ResponseEnvelope> {
    match read_image_field(multipart).await {
        Some(bytes) => Json(service.diagnose_offline(&bytes).await),
        None => Json(ResponseEnvelope::error(NO_IMAGE_APOLOGY)),
    }
}

/// Pull the `file` field's bytes out of a multipart upload.
async fn read_image_field(mut multipart: Multipart) -> Option<Vec<u8>> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            return field.bytes().await.ok().map(|b| b.to_vec());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::backend::{MockCloudModel, MockLocalModel};
    use crate::classifier::FixedClassifier;
    use crate::knowledge::memory::InMemoryKnowledgeStore;
    use crate::pipeline::dispatch::GenerationDispatcher;
    use crate::pipeline::types::Collection;
    use crate::registry::ServiceRegistry;
    use crate::weather::FixedWeather;

    fn test_router(staging: &tempfile::TempDir) -> Router {
        let mut store = InMemoryKnowledgeStore::new();
        store.add(
            Collection::Price,
            "Paddy (common) price at Thanjavur market: Rs 2203 per quintal.",
            "market_price.pdf",
        );
        store.add(
            Collection::Knowledge,
            "remedy for blast: spray tricyclazole at first sign of lesions",
            "tnau_guide.pdf",
        );

        let registry = Arc::new(ServiceRegistry {
            knowledge: Arc::new(store),
            weather: Arc::new(FixedWeather(None)),
            classifier: Some(Arc::new(FixedClassifier {
                label: "blast",
                confidence: 0.92,
            })),
            dispatcher: GenerationDispatcher::new(
                Some(Arc::new(MockCloudModel::translating(
                    "online answer",
                    "what is the paddy price",
                ))),
                Arc::new(MockLocalModel::new("offline answer")),
            ),
            staging_dir: staging.path().to_path_buf(),
        });

        router(Arc::new(AssistantService::new(registry)))
    }

    async fn envelope_from(response: axum::response::Response) -> ResponseEnvelope {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(uri: &str, field_name: &str, content: &[u8]) -> Request<Body> {
        let boundary = "uzhavan-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"leaf.png\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(8, 8);
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn text_query_answers_online_envelope() {
        let staging = tempfile::tempdir().unwrap();
        let app = test_router(&staging);

        let response = app
            .oneshot(json_request(
                "/api/text-query",
                r#"{"question": "நெல் விலை என்ன?"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let envelope = envelope_from(response).await;
        assert_eq!(envelope.answer, "online answer");
        assert_eq!(envelope.source, "Gemini (Hybrid RAG)");
    }

    #[tokio::test]
    async fn offline_query_answers_offline_envelope() {
        let staging = tempfile::tempdir().unwrap();
        let app = test_router(&staging);

        let response = app
            .oneshot(json_request(
                "/api/offline-query",
                r#"{"question": "How do I treat blast?"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let envelope = envelope_from(response).await;
        assert_eq!(envelope.answer, "offline answer");
        assert_eq!(envelope.source, "Ollama (Offline)");
    }

    #[tokio::test]
    async fn malformed_json_still_answers_an_envelope() {
        let staging = tempfile::tempdir().unwrap();
        let app = test_router(&staging);

        let response = app
            .oneshot(json_request("/api/text-query", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let envelope = envelope_from(response).await;
        assert_eq!(envelope.source, "Error");
        assert_eq!(envelope.answer, BAD_REQUEST_APOLOGY);
    }

    #[tokio::test]
    async fn image_diagnosis_answers_hybrid_envelope() {
        let staging = tempfile::tempdir().unwrap();
        let app = test_router(&staging);

        let response = app
            .oneshot(multipart_request("/api/image-diagnosis", "file", &png_bytes()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let envelope = envelope_from(response).await;
        assert_eq!(envelope.source, "Local Model + Gemini");
    }

    #[tokio::test]
    async fn offline_image_diagnosis_carries_confidence_preamble() {
        let staging = tempfile::tempdir().unwrap();
        let app = test_router(&staging);

        let response = app
            .oneshot(multipart_request(
                "/api/offline-image-diagnosis",
                "file",
                &png_bytes(),
            ))
            .await
            .unwrap();

        let envelope = envelope_from(response).await;
        assert_eq!(envelope.source, "Local Model + Phi-3");
        assert!(envelope.answer.starts_with("**I am confident this is blast (92.00%).**"));
    }

    #[tokio::test]
    async fn missing_file_field_answers_error_envelope() {
        let staging = tempfile::tempdir().unwrap();
        let app = test_router(&staging);

        let response = app
            .oneshot(multipart_request("/api/image-diagnosis", "photo", b"ignored"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let envelope = envelope_from(response).await;
        assert_eq!(envelope.source, "Error");
        assert_eq!(envelope.answer, NO_IMAGE_APOLOGY);
    }
}
