//! Embedding providers.
//!
//! The pipelines only see the [`Embedder`] trait; concrete providers are
//! chosen from `[embedding]` in `syllabus.toml` through [`EmbeddingProvider`].

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Produces a fixed-dimensionality vector for a span of text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text. Failures are reported as
    /// [`AppError::UpstreamEmbedding`] carrying the provider's message.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum EmbeddingProvider {
    /// Any OpenAI-compatible `/embeddings` endpoint (OpenAI, Gemini's
    /// OpenAI-compatible API, vLLM, LM Studio, ...).
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        dimensions: Option<usize>,
    },
    /// Local Ollama server
    Ollama { base_url: String, model: String },
}

impl EmbeddingProvider {
    pub fn create_embedder(&self, timeout: Duration) -> Result<Arc<dyn Embedder>> {
        match self {
            EmbeddingProvider::OpenAI {
                api_key,
                api_base,
                model,
                dimensions,
            } => Ok(Arc::new(OpenAIEmbedder::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *dimensions,
                timeout,
            )?)),

            #[cfg(feature = "ollama")]
            EmbeddingProvider::Ollama { base_url, model } => Ok(Arc::new(
                OllamaEmbedder::new(base_url.clone(), model.clone())?,
            )),

            #[cfg(not(feature = "ollama"))]
            EmbeddingProvider::Ollama { model, .. } => Err(AppError::Internal(format!(
                "Ollama embeddings for model '{}' require the `ollama` feature",
                model
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EmbeddingProvider::OpenAI { .. } => "OpenAI",
            EmbeddingProvider::Ollama { .. } => "Ollama",
        }
    }
}

// ============= OpenAI-compatible =============

/// Embeddings client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: Option<usize>,
}

impl OpenAIEmbedder {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        dimensions: Option<usize>,
        timeout: Duration,
    ) -> Result<Self> {
        if model.trim().is_empty() {
            return Err(AppError::Internal("Missing embedding model name".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        let endpoint = format!("{}/embeddings", api_base.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            dimensions,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.trim())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::UpstreamEmbedding(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::UpstreamEmbedding(format!(
                "Embedding provider returned {}: {}",
                status,
                provider_error_message(&body)
            )));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::UpstreamEmbedding(format!("Failed to parse embedding response: {}", e))
        })?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::UpstreamEmbedding("No embedding in response".to_string()))?;

        if embedding.is_empty() {
            return Err(AppError::UpstreamEmbedding(
                "Provider returned an empty embedding".to_string(),
            ));
        }
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Pull the human-readable message out of an OpenAI-style error body.
///
/// Handles `{"error": {"message": ...}}`, the array-wrapped variant some
/// compatible servers send, and `{"error": "..."}`. Anything else is returned
/// trimmed as-is.
fn provider_error_message(body: &str) -> String {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return body.trim().to_string(),
    };

    let error = match &value {
        serde_json::Value::Array(items) => items.first().and_then(|v| v.get("error")),
        other => other.get("error"),
    };

    match error {
        Some(serde_json::Value::String(message)) => message.clone(),
        Some(obj) => obj
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| obj.to_string()),
        None => body.trim().to_string(),
    }
}

// ============= Ollama =============

#[cfg(feature = "ollama")]
pub use self::ollama::OllamaEmbedder;

#[cfg(feature = "ollama")]
mod ollama {
    use super::Embedder;
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use ollama_rs::{generation::embeddings::request::GenerateEmbeddingsRequest, Ollama};

    pub struct OllamaEmbedder {
        client: Ollama,
        model: String,
    }

    impl OllamaEmbedder {
        pub fn new(base_url: String, model: String) -> Result<Self> {
            let url = reqwest::Url::parse(&base_url)
                .map_err(|e| AppError::Internal(format!("Invalid Ollama URL '{}': {}", base_url, e)))?;

            Ok(Self {
                client: Ollama::from_url(url),
                model,
            })
        }
    }

    #[async_trait]
    impl Embedder for OllamaEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let request = GenerateEmbeddingsRequest::new(self.model.clone(), text.to_string().into());

            let response = self
                .client
                .generate_embeddings(request)
                .await
                .map_err(|e| AppError::UpstreamEmbedding(format!("Ollama error: {}", e)))?;

            response
                .embeddings
                .into_iter()
                .next()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::UpstreamEmbedding("No embedding from Ollama".to_string()))
        }

        fn model_name(&self) -> &str {
            &self.model
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_name() {
        let openai = EmbeddingProvider::OpenAI {
            api_key: "".into(),
            api_base: "".into(),
            model: "".into(),
            dimensions: None,
        };
        assert_eq!(openai.name(), "OpenAI");

        let ollama = EmbeddingProvider::Ollama {
            base_url: "http://localhost:11434".into(),
            model: "nomic-embed-text".into(),
        };
        assert_eq!(ollama.name(), "Ollama");
    }

    #[test]
    fn test_openai_embedder_requires_model() {
        let result = OpenAIEmbedder::new(
            "key".into(),
            "https://api.openai.com/v1".into(),
            "  ".into(),
            None,
            Duration::from_secs(5),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_error_message_shapes() {
        assert_eq!(
            provider_error_message(r#"{"error": {"message": "quota exceeded", "code": 429}}"#),
            "quota exceeded"
        );
        assert_eq!(
            provider_error_message(r#"[{"error": {"code": 400, "message": "API key not valid"}}]"#),
            "API key not valid"
        );
        assert_eq!(provider_error_message(r#"{"error": "model not found"}"#), "model not found");
        assert_eq!(provider_error_message("  upstream down \n"), "upstream down");
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let embedder = OpenAIEmbedder::new(
            "key".into(),
            "http://localhost:8080/v1/".into(),
            "text-embedding-3-small".into(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(embedder.endpoint, "http://localhost:8080/v1/embeddings");
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
    }
}
