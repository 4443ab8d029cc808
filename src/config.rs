use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Uzhavan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "info,uzhavan=debug".to_string()
}

/// Get the application data directory
/// ~/Uzhavan/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Uzhavan")
}

/// Staging directory for uploaded crop photos awaiting diagnosis.
/// Files here are transient; every request removes its own staged copy.
pub fn staging_dir() -> PathBuf {
    app_data_dir().join("staging")
}

/// Get the models directory (ONNX disease classifier weights)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Runtime settings, resolved once at process start.
///
/// Everything has a local-development default so `uzhavan` starts without a
/// config file; production deployments override through the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the retrieval service holding the document collections.
    pub retrieval_url: String,
    /// Collection name for the general rice knowledge base.
    pub knowledge_collection: String,
    /// Collection name for the daily market price database.
    pub price_collection: String,
    /// Gemini API key. `None` means the cloud backend is unconfigured and
    /// every online request will answer with the error envelope.
    pub gemini_api_key: Option<String>,
    /// Gemini model used for translation and online generation.
    pub gemini_model: String,
    /// Base URL of the local Ollama instance.
    pub ollama_url: String,
    /// Ollama model used for offline generation.
    pub ollama_model: String,
    /// Bind address for the HTTP surface.
    pub bind_addr: String,
}

impl Settings {
    /// Read settings from the environment, falling back to local defaults.
    pub fn from_env() -> Self {
        Self {
            retrieval_url: env_or("UZHAVAN_RETRIEVAL_URL", "http://localhost:8000"),
            knowledge_collection: env_or("UZHAVAN_KNOWLEDGE_COLLECTION", "rice_knowledge_base"),
            price_collection: env_or("UZHAVAN_PRICE_COLLECTION", "market_price_db"),
            gemini_api_key: std::env::var("GOOGLE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            gemini_model: env_or("UZHAVAN_GEMINI_MODEL", "gemini-1.5-flash-latest"),
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: env_or("UZHAVAN_OLLAMA_MODEL", "phi3"),
            bind_addr: env_or("UZHAVAN_BIND_ADDR", "127.0.0.1:8080"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Uzhavan"));
    }

    #[test]
    fn staging_dir_under_app_data() {
        let staging = staging_dir();
        assert!(staging.starts_with(app_data_dir()));
        assert!(staging.ends_with("staging"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn env_or_prefers_default_for_missing_var() {
        assert_eq!(env_or("UZHAVAN_TEST_UNSET_VAR", "fallback"), "fallback");
    }
}
