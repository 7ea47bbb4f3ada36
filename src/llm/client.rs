//! LLM Client abstractions and provider management
//!
//! Two providers are supported:
//! - **OpenAI**: any OpenAI-compatible `/chat/completions` endpoint
//! - **Ollama**: local inference (feature `ollama`)

use crate::types::{AppError, ChatMessage, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code. Failures are
/// reported as [`AppError::UpstreamGeneration`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_history(&[ChatMessage::user(prompt)])
            .await
    }

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_with_history(&[ChatMessage::system(system), ChatMessage::user(prompt)])
            .await
    }

    /// Generate from an ordered list of role-tagged messages
    async fn generate_with_history(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o-mini".to_string(),
    ///     temperature: Some(0.7),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        temperature: Option<f32>,
    },

    /// Ollama local LLM provider
    Ollama {
        base_url: String,
        model: String,
        temperature: Option<f32>,
    },
}

impl Provider {
    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the provider was
    /// compiled out.
    pub fn create_client(&self, timeout: Duration) -> Result<Arc<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                temperature,
            } => Ok(Arc::new(
                super::openai::OpenAIClient::new(
                    api_key.clone(),
                    api_base.clone(),
                    model.clone(),
                    timeout,
                )?
                .with_temperature(*temperature),
            )),

            #[cfg(not(feature = "openai"))]
            Provider::OpenAI { model, .. } => Err(AppError::Internal(format!(
                "OpenAI generation for model '{}' requires the `openai` feature",
                model
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                temperature,
            } => Ok(Arc::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone())?
                    .with_temperature(*temperature),
            )),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { model, .. } => Err(AppError::Internal(format!(
                "Ollama generation for model '{}' requires the `ollama` feature",
                model
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenAI { model, .. } | Provider::Ollama { model, .. } => model,
        }
    }
}

/// Any failure of the generation capability is an upstream generation error.
pub(crate) fn as_upstream_generation(err: AppError) -> AppError {
    match err {
        AppError::UpstreamGeneration(_) => err,
        other => AppError::UpstreamGeneration(other.to_string()),
    }
}
