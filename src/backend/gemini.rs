//! Gemini HTTP client, the cloud generation backend.
//!
//! Used by online request paths for both the translation sub-step and final
//! generation. No retries here: a failed call surfaces as `BackendError` and
//! the dispatcher reports it upward (retry policy, if any, belongs to the
//! hosted service, not the orchestration layer).

use serde::{Deserialize, Serialize};

use super::{BackendError, CloudModel};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini REST client for text completion and translation.
pub struct GeminiClient {
    api_base: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

/// Request body for models/{model}:generateContent
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response body from models/{model}:generateContent
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_base: GEMINI_API_BASE.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                BackendError::Connection("Gemini".to_string())
            } else if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else {
                BackendError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(BackendError::EmptyCompletion);
        }

        Ok(text)
    }
}

impl CloudModel for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        self.generate(prompt)
    }

    fn translate(&self, text: &str, target_lang: &str) -> Result<String, BackendError> {
        let prompt = format!(
            "Translate to {target_lang}: '{text}'. Reply with the translation only."
        );
        Ok(self.generate(&prompt)?.trim().to_string())
    }
}
