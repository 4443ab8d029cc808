pub mod gemini;
pub mod ollama;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection to {0} failed")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Backend returned an empty completion")]
    EmptyCompletion,
}

/// Cloud-hosted generation backend: text completion plus translation.
///
/// Calls are blocking and run on the blocking pool via the dispatcher.
pub trait CloudModel: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, BackendError>;
    fn translate(&self, text: &str, target_lang: &str) -> Result<String, BackendError>;
}

/// Locally-hosted generation backend: text completion only.
pub trait LocalModel: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}

// ── Test doubles ────────────────────────────────────────────
// Shared by dispatcher, orchestrator, and API tests.

/// Mock cloud backend returning canned completions and translations.
pub struct MockCloudModel {
    pub completion: Result<String, &'static str>,
    pub translation: String,
}

impl MockCloudModel {
    /// Succeeds with `completion`; translation echoes the input.
    pub fn echoing(completion: &str) -> Self {
        Self {
            completion: Ok(completion.to_string()),
            translation: String::new(),
        }
    }

    /// Succeeds with `completion` and always translates to `translation`.
    pub fn translating(completion: &str, translation: &str) -> Self {
        Self {
            completion: Ok(completion.to_string()),
            translation: translation.to_string(),
        }
    }

    /// Every call fails.
    pub fn failing(message: &'static str) -> Self {
        Self {
            completion: Err(message),
            translation: String::new(),
        }
    }
}

impl CloudModel for MockCloudModel {
    fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
        match &self.completion {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(BackendError::Connection(msg.to_string())),
        }
    }

    fn translate(&self, text: &str, _target_lang: &str) -> Result<String, BackendError> {
        match &self.completion {
            Ok(_) if self.translation.is_empty() => Ok(text.to_string()),
            Ok(_) => Ok(self.translation.clone()),
            Err(msg) => Err(BackendError::Connection(msg.to_string())),
        }
    }
}

/// Mock local backend returning a canned completion.
pub struct MockLocalModel {
    pub completion: Result<String, &'static str>,
}

impl MockLocalModel {
    pub fn new(completion: &str) -> Self {
        Self {
            completion: Ok(completion.to_string()),
        }
    }

    pub fn failing(message: &'static str) -> Self {
        Self {
            completion: Err(message),
        }
    }
}

impl LocalModel for MockLocalModel {
    fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
        match &self.completion {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(BackendError::Connection(msg.to_string())),
        }
    }
}
