//! Grading backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for grading backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for the Google Gemini `generateContent` API and
//! for `OpenAI`-compatible chat completions APIs with audio input. All
//! backends communicate over HTTP via `reqwest`.
//!
//! The audio payload travels inline as base64; the backend does not care
//! how it was recorded, only that it is an `audio/mp4` container.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use quest_core::ports::{GradeError, VoiceGrader};
use quest_types::GradedReport;
use tracing::debug;

use crate::config::{BackendType, GraderConfig};
use crate::error::GraderError;
use crate::parse::parse_graded_report;
use crate::prompt::{PromptEngine, RenderedPrompt};

// ---------------------------------------------------------------------------
// Unified backend enum (dyn-compatible alternative to async trait)
// ---------------------------------------------------------------------------

/// A grading backend that can appraise one voice report.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible in Rust.
pub enum GraderBackend {
    /// Google Gemini `generateContent` API.
    Gemini(GeminiBackend),
    /// `OpenAI`-compatible chat completions API.
    OpenAiCompatible(OpenAiBackend),
}

impl GraderBackend {
    /// Send a rendered prompt plus audio and return the raw response text.
    ///
    /// Dispatches to the concrete backend implementation.
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        audio_b64: &str,
    ) -> Result<String, GraderError> {
        match self {
            Self::Gemini(backend) => backend.complete(prompt, audio_b64).await,
            Self::OpenAiCompatible(backend) => backend.complete(prompt, audio_b64).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::OpenAiCompatible(_) => "openai-compatible",
        }
    }
}

// ---------------------------------------------------------------------------
// Gemini backend
// ---------------------------------------------------------------------------

/// Backend for the Google Gemini `generateContent` API.
///
/// Sends requests to `{api_url}/models/{model}:generateContent` with the
/// API key as a query parameter and the audio as an `inline_data` part.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(config: &GraderConfig) -> Result<Self, GraderError> {
        Ok(Self {
            client: build_client(config)?,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Send a prompt plus inline audio and return the response text.
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        audio_b64: &str,
    ) -> Result<String, GraderError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_url, self.model, self.api_key
        );

        let body = serde_json::json!({
            "system_instruction": {
                "parts": [{"text": prompt.system}]
            },
            "contents": [{
                "parts": [
                    {"text": prompt.user},
                    {"inline_data": {"mime_type": "audio/mp4", "data": audio_b64}}
                ]
            }],
            "generationConfig": {"response_mime_type": "application/json"}
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GraderError::Http(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(GraderError::Http(format!(
                "Gemini returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GraderError::Http(format!("Gemini response parse failed: {e}")))?;

        extract_gemini_content(&json)
    }
}

/// Extract the text content from a Gemini `generateContent` response.
fn extract_gemini_content(json: &serde_json::Value) -> Result<String, GraderError> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            GraderError::Http(
                "Gemini response missing candidates[0].content.parts[0].text".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for `OpenAI`-compatible chat completions APIs with audio input.
///
/// Sends requests to `{api_url}/chat/completions` with the audio as an
/// `input_audio` content part.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: &GraderConfig) -> Result<Self, GraderError> {
        Ok(Self {
            client: build_client(config)?,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Send a prompt plus inline audio and return the response text.
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        audio_b64: &str,
    ) -> Result<String, GraderError> {
        let url = format!("{}/chat/completions", self.api_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": [
                    {"type": "text", "text": prompt.user},
                    {"type": "input_audio", "input_audio": {"data": audio_b64, "format": "mp4"}}
                ]}
            ],
            "temperature": 0.2,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GraderError::Http(format!("chat completions request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(GraderError::Http(format!(
                "chat completions returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            GraderError::Http(format!("chat completions response parse failed: {e}"))
        })?;

        extract_openai_content(&json)
    }
}

/// Extract the text content from a chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, GraderError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            GraderError::Http("response missing choices[0].message.content".to_owned())
        })
}

/// Build the shared HTTP client with the configured deadline.
fn build_client(config: &GraderConfig) -> Result<reqwest::Client, GraderError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| GraderError::Http(format!("failed to build http client: {e}")))
}

// ---------------------------------------------------------------------------
// The grader
// ---------------------------------------------------------------------------

/// The production voice grader: prompt engine plus HTTP backend.
///
/// Implements [`VoiceGrader`] so the session state machine in
/// `quest-core` can drive it without knowing which vendor is behind it.
pub struct Grader {
    engine: PromptEngine,
    backend: GraderBackend,
}

impl Grader {
    /// Build a grader from configuration.
    ///
    /// Loads the prompt templates and constructs the configured backend.
    pub fn new(config: &GraderConfig) -> Result<Self, GraderError> {
        let engine = PromptEngine::new(&config.templates_dir)?;
        let backend = match config.backend_type {
            BackendType::Gemini => GraderBackend::Gemini(GeminiBackend::new(config)?),
            BackendType::OpenAiCompatible => {
                GraderBackend::OpenAiCompatible(OpenAiBackend::new(config)?)
            }
        };
        Ok(Self { engine, backend })
    }
}

impl VoiceGrader for Grader {
    async fn grade(
        &self,
        audio: &[u8],
        quest_title: &str,
        is_retry: bool,
    ) -> Result<GradedReport, GradeError> {
        let prompt = self.engine.render(quest_title, is_retry)?;
        let audio_b64 = BASE64.encode(audio);

        debug!(
            backend = self.backend.name(),
            quest_title,
            is_retry,
            audio_bytes = audio.len(),
            "sending voice report for appraisal"
        );

        let raw = self.backend.complete(&prompt, &audio_b64).await?;
        let report = parse_graded_report(&raw)?;

        debug!(rank = %report.rank, "appraisal received");
        Ok(report)
    }
}
