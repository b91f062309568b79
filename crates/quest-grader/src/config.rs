//! Configuration for the grading backend.
//!
//! All of it comes from environment variables so the same binary can point
//! at Gemini in production and a local `OpenAI`-compatible stub in
//! development without recompiling.

use std::time::Duration;

use crate::error::GraderError;

/// Which grading API to speak to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendType {
    /// Google Gemini `generateContent` API (inline audio parts).
    Gemini,
    /// An `OpenAI`-compatible chat completions API with audio input.
    OpenAiCompatible,
}

/// Complete grader configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// The backend type to dispatch to.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier (e.g. `gemini-1.5-flash`).
    pub model: String,
    /// Path to the prompt templates directory.
    pub templates_dir: String,
    /// Hard deadline applied to every grading HTTP call.
    pub timeout: Duration,
}

impl GraderConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `GRADER_BACKEND` -- `gemini` or `openai`
    /// - `GRADER_API_KEY` -- API key
    ///
    /// Optional variables:
    /// - `GRADER_API_URL` -- base URL (defaults per backend)
    /// - `GRADER_MODEL` -- model name (default `gemini-1.5-flash`)
    /// - `GRADER_TEMPLATES_DIR` -- prompt templates (default `templates`)
    /// - `GRADING_TIMEOUT_MS` -- HTTP deadline in milliseconds (default 15000)
    pub fn from_env() -> Result<Self, GraderError> {
        let backend_str = env_var("GRADER_BACKEND")?;
        let backend_type = match backend_str.to_lowercase().as_str() {
            "gemini" => BackendType::Gemini,
            "openai" | "openai-compatible" | "ollama" => BackendType::OpenAiCompatible,
            other => {
                return Err(GraderError::Config(format!(
                    "unknown grader backend: {other}"
                )));
            }
        };

        let api_url = std::env::var("GRADER_API_URL")
            .unwrap_or_else(|_| default_api_url(&backend_type).to_owned());
        let api_key = env_var("GRADER_API_KEY")?;
        let model =
            std::env::var("GRADER_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_owned());
        let templates_dir =
            std::env::var("GRADER_TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_owned());

        let timeout_ms: u64 = std::env::var("GRADING_TIMEOUT_MS")
            .unwrap_or_else(|_| "15000".to_owned())
            .parse()
            .map_err(|e| GraderError::Config(format!("invalid GRADING_TIMEOUT_MS: {e}")))?;

        Ok(Self {
            backend_type,
            api_url,
            api_key,
            model,
            templates_dir,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Default base URL per backend.
const fn default_api_url(backend: &BackendType) -> &'static str {
    match backend {
        BackendType::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        BackendType::OpenAiCompatible => "https://api.openai.com/v1",
    }
}

/// Read a required environment variable.
fn env_var(name: &str) -> Result<String, GraderError> {
    std::env::var(name)
        .map_err(|e| GraderError::Config(format!("missing required env var {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls_per_backend() {
        assert!(default_api_url(&BackendType::Gemini).contains("googleapis"));
        assert!(default_api_url(&BackendType::OpenAiCompatible).contains("openai"));
    }

    #[test]
    fn config_construction() {
        // Direct construction since from_env requires real env vars.
        let config = GraderConfig {
            backend_type: BackendType::Gemini,
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            api_key: "test-key".to_owned(),
            model: "gemini-1.5-flash".to_owned(),
            templates_dir: "templates".to_owned(),
            timeout: Duration::from_millis(15_000),
        };
        assert_eq!(config.backend_type, BackendType::Gemini);
        assert_eq!(config.timeout.as_millis(), 15_000);
    }
}
